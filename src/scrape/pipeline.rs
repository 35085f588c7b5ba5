use serde::Serialize;

use crate::telemetry::{self};

use super::config::ScrapeConfig;
use super::crawl::{self, CrawlOutcome};
use super::feed;
use super::fetch::Fetch;
use super::product::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy { Feed, Crawl, None }

/// Everything one run produced, in fetch/discovery order.
#[derive(Debug)]
pub struct Harvest {
    pub strategy: Strategy,
    pub products: Vec<Product>,
    pub crawl: Option<CrawlOutcome>,
}

/// Feed first; on failure the page crawl. Never errors: if both tiers fail the
/// harvest is empty.
pub async fn run<F: Fetch>(fetcher: &F, base: &str, cfg: &ScrapeConfig) -> Harvest {
    let log = telemetry::scrape();

    if cfg.skip_feed {
        log.info("⏭️  Feed skipped (--skip-feed)");
    } else {
        match feed::fetch_all(fetcher, base, cfg).await {
            Ok(products) => {
                log.info(format!("📡 Feed produced {} product(s)", products.len()));
                return Harvest { strategy: Strategy::Feed, products, crawl: None };
            }
            Err(e) => log.warn_kv(
                &format!("⚠️  Feed unavailable ({:#}); falling back to page crawl", e),
                [("error", format!("{:#}", e))],
            ),
        }
    }

    match crawl::crawl(fetcher, base, cfg).await {
        Ok(mut outcome) => {
            let products = std::mem::take(&mut outcome.products);
            Harvest { strategy: Strategy::Crawl, products, crawl: Some(outcome) }
        }
        Err(e) => {
            log.error_kv(&format!("❌ Page crawl failed: {:#}", e), [("error", format!("{:#}", e))]);
            Harvest { strategy: Strategy::None, products: Vec::new(), crawl: None }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::crawl::catalog_url;
    use crate::scrape::feed::feed_page_url;
    use crate::scrape::fetch::stub::StubFetcher;
    use serde_json::json;

    const BASE: &str = "https://shop.test";

    fn feed_url() -> String { feed_page_url(BASE, 250, 1) }

    #[tokio::test]
    async fn feed_success_skips_crawl() {
        let body = json!({"products": [{"id": 1, "handle": "a", "title": "A", "variants": [{"price": "3.00"}]}]});
        let stub = StubFetcher::default().with(&feed_url(), body.to_string());
        let h = run(&stub, BASE, &ScrapeConfig::unthrottled()).await;
        assert_eq!(h.strategy, Strategy::Feed);
        assert_eq!(h.products.len(), 1);
        assert_eq!(stub.requested(), vec![feed_url()]);
    }

    #[tokio::test]
    async fn empty_feed_falls_back_to_crawl() {
        let stub = StubFetcher::default()
            .with(&feed_url(), json!({"products": []}).to_string())
            .with(&catalog_url(BASE), r#"<a href="/products/x">x</a>"#)
            .with("https://shop.test/products/x", "<h1>X</h1>");
        let h = run(&stub, BASE, &ScrapeConfig::unthrottled()).await;
        assert_eq!(h.strategy, Strategy::Crawl);
        assert_eq!(h.products.len(), 1);
        assert_eq!(h.products[0].title, "X");
        assert!(stub.requested().contains(&catalog_url(BASE)));
        assert_eq!(h.crawl.map(|c| c.markup), Some(1));
    }

    #[tokio::test]
    async fn all_tiers_failing_yields_empty_harvest() {
        let stub = StubFetcher::default();
        let h = run(&stub, BASE, &ScrapeConfig::unthrottled()).await;
        assert_eq!(h.strategy, Strategy::None);
        assert!(h.products.is_empty());
        assert_eq!(stub.requested(), vec![feed_url(), catalog_url(BASE)]);
    }

    #[tokio::test]
    async fn skip_feed_goes_straight_to_crawl() {
        let stub = StubFetcher::default().with(&catalog_url(BASE), "<p>empty catalog</p>");
        let cfg = ScrapeConfig { skip_feed: true, ..ScrapeConfig::unthrottled() };
        let h = run(&stub, BASE, &cfg).await;
        assert_eq!(h.strategy, Strategy::Crawl);
        assert!(h.products.is_empty());
        assert_eq!(stub.requested(), vec![catalog_url(BASE)]);
    }
}
