use std::collections::HashSet;

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use serde::Serialize;
use tokio::time::sleep;
use tracing::Instrument;
use url::Url;

use crate::telemetry::{self};
use crate::telemetry::ops::scrape::Phase as ScrapePhase;

use super::config::ScrapeConfig;
use super::extractor::{extract_page, PRODUCT_PATH_MARKER};
use super::fetch::Fetch;
use super::product::{PageTier, Product};

#[derive(Debug, Default, Serialize)]
pub struct CrawlOutcome {
    #[serde(skip)]
    pub products: Vec<Product>,
    pub discovered: usize,
    pub failed: usize,
    pub structured: usize,
    pub markup: usize,
}

pub fn catalog_url(base: &str) -> String {
    format!("{}/collections/all", base)
}

/// Product links in discovery order. Absolute hrefs are kept verbatim, anything
/// else resolves against `base`; duplicates are dropped by exact string.
pub fn discover_product_urls(html: &str, base: &Url) -> Vec<String> {
    let doc = Html::parse_document(html);
    let Ok(sel) = Selector::parse("a[href]") else { return Vec::new() };

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for a in doc.select(&sel) {
        let Some(href) = a.value().attr("href").map(str::trim) else { continue };
        if !href.contains(PRODUCT_PATH_MARKER) { continue; }
        let resolved = if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            match base.join(href) {
                Ok(u) => u.to_string(),
                Err(_) => continue,
            }
        };
        if seen.insert(resolved.clone()) { out.push(resolved); }
    }
    out
}

/// Discover from the catalog page, then extract each product page in order.
/// Only an unreachable catalog fails; individual pages are skipped on error.
pub async fn crawl<F: Fetch>(fetcher: &F, base: &str, cfg: &ScrapeConfig) -> Result<CrawlOutcome> {
    let log = telemetry::scrape();
    let base_url = Url::parse(base).with_context(|| format!("parse base url {}", base))?;
    let catalog = catalog_url(base);

    let html = fetcher
        .get_text(&catalog)
        .instrument(log.span_kv(&ScrapePhase::Discover, [("url", catalog.clone())]))
        .await
        .with_context(|| format!("fetch catalog {}", catalog))?;
    let urls = discover_product_urls(&html, &base_url);
    log.info_kv(
        &format!("🔎 Found {} product link(s) on {}", urls.len(), catalog),
        [("catalog", catalog.clone()), ("discovered", urls.len().to_string())],
    );

    let mut outcome = CrawlOutcome { discovered: urls.len(), ..CrawlOutcome::default() };
    for (i, url) in urls.iter().enumerate() {
        if i > 0 { sleep(cfg.product_delay).await; }

        let page = fetcher
            .get_text(url)
            .instrument(log.span_kv(&ScrapePhase::FetchPage, [("url", url.clone())]))
            .await;
        let html = match page {
            Ok(h) => h,
            Err(e) => {
                outcome.failed += 1;
                log.warn_kv(&format!("⚠️  Skipping {}: {:#}", url, e), [("url", url.clone()), ("error", format!("{:#}", e))]);
                continue;
            }
        };

        let (product, tier) = {
            let _s = log.span(&ScrapePhase::Extract).entered();
            extract_page(&html, url)
        };
        match tier {
            PageTier::StructuredData => outcome.structured += 1,
            PageTier::Markup => outcome.markup += 1,
        }
        log.info_kv(
            &format!("✅ [{}/{}] {} ({:?})", i + 1, urls.len(), product.title, tier),
            [("url", url.clone()), ("tier", format!("{:?}", tier))],
        );
        outcome.products.push(product);
    }

    Ok(outcome)
}
