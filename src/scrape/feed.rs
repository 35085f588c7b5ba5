use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::Instrument;
use url::Url;

use crate::telemetry::{self};
use crate::telemetry::ops::scrape::Phase as ScrapePhase;

use super::config::ScrapeConfig;
use super::fetch::Fetch;
use super::normalize::{derive_price, normalize_images, normalize_product, parse_price_value};
use super::product::{Product, ProductId, Variant};

#[derive(Deserialize)]
struct FeedPage {
    #[serde(default)]
    products: Vec<RawProduct>,
}

#[derive(Deserialize)]
pub struct RawProduct {
    #[serde(default)]
    id: Option<ProductId>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    handle: String,
    #[serde(default)]
    body_html: Option<String>,
    #[serde(default)]
    images: Vec<RawImage>,
    #[serde(default)]
    variants: Vec<RawVariant>,
}

#[derive(Deserialize)]
struct RawImage {
    #[serde(default)]
    src: Option<String>,
}

#[derive(Deserialize)]
struct RawVariant {
    #[serde(default)]
    id: Option<ProductId>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    price: Value,
    #[serde(default)]
    sku: Option<String>,
}

pub fn feed_page_url(base: &str, page_size: usize, page: usize) -> String {
    format!("{}/products.json?limit={}&page={}", base, page_size, page)
}

/// Walk the feed until a short page. Any error, or an empty first page, fails the
/// whole strategy and discards what earlier pages produced.
pub async fn fetch_all<F: Fetch>(fetcher: &F, base: &str, cfg: &ScrapeConfig) -> Result<Vec<Product>> {
    let log = telemetry::scrape();
    let base_url = Url::parse(base).ok();
    let mut products: Vec<Product> = Vec::new();
    let mut page = 1usize;

    loop {
        let url = feed_page_url(base, cfg.page_size, page);
        let entries = fetch_page(fetcher, &url)
            .instrument(log.span_kv(&ScrapePhase::FeedPage, [("page", page.to_string()), ("url", url.clone())]))
            .await?;

        let count = entries.len();
        if count == 0 && page == 1 {
            bail!("feed returned no products on page 1");
        }

        for raw in entries {
            let p = map_entry(raw, base, base_url.as_ref());
            log.debug_kv("entry", [("handle", p.handle.clone())]);
            products.push(p);
            sleep(cfg.entry_delay).await;
        }
        log.info_kv(
            &format!("📦 Feed page {} → {} product(s), {} total", page, count, products.len()),
            [("page", page.to_string()), ("count", count.to_string()), ("total", products.len().to_string())],
        );

        if count < cfg.page_size { break; }
        if cfg.max_pages.is_some_and(|max| page >= max) {
            log.warn(format!("⚠️  Stopping at --max-pages={} with a full page; more products may exist", page));
            break;
        }
        page += 1;
        sleep(cfg.page_delay).await;
    }

    Ok(products)
}

async fn fetch_page<F: Fetch>(fetcher: &F, url: &str) -> Result<Vec<RawProduct>> {
    let body = fetcher.get_bytes(url).await?;
    let page: FeedPage = serde_json::from_slice(&body).with_context(|| format!("parse feed page {}", url))?;
    Ok(page.products)
}

/// One feed entry → canonical record.
pub fn map_entry(raw: RawProduct, base: &str, base_url: Option<&Url>) -> Product {
    let prices: Vec<f64> = raw.variants.iter().filter_map(|v| parse_price_value(&v.price)).collect();
    let images = normalize_images(raw.images.iter().filter_map(|i| i.src.as_deref()), base_url);
    let variants = raw
        .variants
        .into_iter()
        .map(|v| Variant { id: v.id, title: v.title, price: parse_price_value(&v.price), sku: v.sku.filter(|s| !s.is_empty()) })
        .collect();

    normalize_product(Product {
        id: raw.id.unwrap_or_else(|| ProductId::Text(raw.handle.clone())),
        url: format!("{}/products/{}", base, raw.handle),
        handle: raw.handle,
        title: raw.title,
        description: raw.body_html.unwrap_or_default(),
        price: derive_price(prices),
        images,
        variants: Some(variants),
        timestamp: Utc::now(),
    })
}
