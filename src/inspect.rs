use std::env;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use tracing::Instrument;

use crate::scrape::config::DEFAULT_TIMEOUT_SECS;
use crate::scrape::extractor::extract_page;
use crate::scrape::fetch::{Fetch, HttpFetcher, DEFAULT_USER_AGENT};
use crate::scrape::product::{PageTier, Product};
use crate::telemetry::{self};
use crate::telemetry::ops::inspect::Phase as InspectPhase;

#[derive(Args, Debug)]
pub struct InspectCmd {
    /// Single product page to extract
    pub url: String,
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)] pub timeout_secs: u64,
    #[arg(long)] pub user_agent: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InspectResult {
    pub tier: PageTier,
    pub product: Product,
}

/// entry point for inspect
pub async fn run(args: InspectCmd) -> Result<()> {
    let log = telemetry::inspect();
    let started = Instant::now();
    let span = log.root_span_kv([("url", args.url.clone())]);

    let user_agent = args.user_agent
        .or_else(|| env::var("SHOP_USER_AGENT").ok().filter(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
    let fetcher = HttpFetcher::new(&user_agent, Duration::from_secs(args.timeout_secs))?;

    let result = inspect_page(&fetcher, &args.url).instrument(span).await?;

    if telemetry::config::json_mode() {
        log.result(&result, started)?;
    } else {
        println!("🔍 {} ({:?})", result.product.url, result.tier);
        println!("{}", serde_json::to_string_pretty(&result.product)?);
    }
    Ok(())
}

pub async fn inspect_page<F: Fetch>(fetcher: &F, url: &str) -> Result<InspectResult> {
    let log = telemetry::inspect();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        bail!("Invalid URL (expected http/https): {}", url);
    }

    let html = fetcher
        .get_text(url)
        .instrument(log.span(&InspectPhase::Fetch))
        .await?;
    let (product, tier) = {
        let _s = log.span(&InspectPhase::Extract).entered();
        extract_page(&html, url)
    };
    log.info_kv(
        &format!("✅ {} via {:?}", product.title, tier),
        [("tier", format!("{:?}", tier)), ("images", product.images.len().to_string())],
    );
    Ok(InspectResult { tier, product })
}
