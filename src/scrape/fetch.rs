use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::Client;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// GET capability used by every tier. Non-2xx responses are errors.
pub trait Fetch {
    async fn get_bytes(&self, url: &str) -> Result<Bytes>;

    async fn get_text(&self, url: &str) -> Result<String> {
        let body = self.get_bytes(url).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn get_bytes(&self, url: &str) -> Result<Bytes> {
        let resp = self.client.get(url).send().await
            .with_context(|| format!("GET {}", url))?
            .error_for_status()
            .with_context(|| format!("GET {}", url))?;
        let bytes = resp.bytes().await.with_context(|| format!("read body {}", url))?;
        Ok(bytes)
    }
}
