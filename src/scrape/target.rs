use anyhow::{bail, Result};
use url::Url;

/// The storefront a run is pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Scheme-qualified origin + path; no query, fragment or trailing slash (`https://shop.example.com`).
    pub base: String,
    /// Host with any leading `www.` removed; names the output directory.
    pub host: String,
}

impl Target {
    /// `shop.example.com/` → `https://shop.example.com`. Fails on anything without a host.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() { bail!("Invalid URL: empty input"); }

        let with_scheme = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{}", trimmed) };

        let Ok(mut parsed) = Url::parse(&with_scheme) else { bail!("Invalid URL: {}", input) };
        if !matches!(parsed.scheme(), "http" | "https") { bail!("Invalid URL (unsupported scheme): {}", input); }
        let Some(host) = parsed.host_str() else { bail!("Invalid URL (no host): {}", input) };
        let host = host.strip_prefix("www.").unwrap_or(host).to_string();

        // endpoints are appended to the base, so it carries no query or fragment
        parsed.set_query(None);
        parsed.set_fragment(None);
        let base = parsed.as_str().trim_end_matches('/').to_string();

        Ok(Target { base, host })
    }
}
