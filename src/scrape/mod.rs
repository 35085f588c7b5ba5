use std::env;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Args;
use tracing::Instrument;

use crate::telemetry::{self};
use crate::telemetry::ops::scrape::Phase as ScrapePhase;

pub mod config;
pub mod crawl;
pub mod extractor;
pub mod feed;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod product;
pub mod target;
pub mod types;
pub mod write;

use config::{ScrapeConfig, DEFAULT_ENTRY_DELAY_MS, DEFAULT_PAGE_DELAY_MS, DEFAULT_PRODUCT_DELAY_MS, DEFAULT_TIMEOUT_SECS, PAGE_SIZE};
use fetch::{HttpFetcher, DEFAULT_USER_AGENT};
use target::Target;
use types::{ScrapePlan, ScrapeResult};

const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Args, Debug)]
pub struct ScrapeCmd {
    /// Storefront URL; `https://` is assumed when no scheme is given
    pub url: String,
    #[arg(long, default_value_t = false)] pub apply: bool,
    /// Falls back to SHOP_OUTPUT_DIR, then `output`
    #[arg(long)] pub output_dir: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)] pub timeout_secs: u64,
    /// Falls back to SHOP_USER_AGENT, then a desktop browser string
    #[arg(long)] pub user_agent: Option<String>,
    #[arg(long, default_value_t = DEFAULT_ENTRY_DELAY_MS)] pub entry_delay_ms: u64,
    #[arg(long, default_value_t = DEFAULT_PAGE_DELAY_MS)] pub page_delay_ms: u64,
    #[arg(long, default_value_t = DEFAULT_PRODUCT_DELAY_MS)] pub product_delay_ms: u64,
    #[arg(long)] pub max_pages: Option<usize>,
    #[arg(long, default_value_t = false)] pub skip_feed: bool,
}

impl ScrapeCmd {
    fn scrape_config(&self) -> ScrapeConfig {
        ScrapeConfig {
            page_size: PAGE_SIZE,
            entry_delay: Duration::from_millis(self.entry_delay_ms),
            page_delay: Duration::from_millis(self.page_delay_ms),
            product_delay: Duration::from_millis(self.product_delay_ms),
            max_pages: self.max_pages,
            skip_feed: self.skip_feed,
        }
    }

    fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(|| env::var_os("SHOP_OUTPUT_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .or_else(|| env::var("SHOP_USER_AGENT").ok().filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }
}

pub async fn run(args: ScrapeCmd) -> Result<()> {
    let log = telemetry::scrape();
    let span = log.root_span_kv([
        ("apply", args.apply.to_string()),
        ("url", args.url.clone()),
        ("skip_feed", args.skip_feed.to_string()),
        ("max_pages", format!("{:?}", args.max_pages)),
    ]);
    execute(args).instrument(span).await
}

async fn execute(args: ScrapeCmd) -> Result<()> {
    let log = telemetry::scrape();
    let started = Instant::now();

    // an unusable URL is fatal before any request goes out
    let target = Target::parse(&args.url)?;
    let output_dir = args.output_dir();
    let cfg = args.scrape_config();

    if !args.apply {
        let plan = {
            let _s = log.span(&ScrapePhase::Plan).entered();
            build_plan(&target, &output_dir, &cfg)
        };
        if telemetry::config::json_mode() {
            log.plan(&plan)?;
        } else {
            log.info(format!("📝 Scrape plan — base={} host={}", plan.base_url, plan.host));
            if plan.skip_feed { log.info("  feed: skipped"); } else { log.info(format!("  feed: {} (limit {})", plan.feed_url, plan.page_size)); }
            log.info(format!("  catalog: {}", plan.catalog_url));
            log.info(format!("  output: {}", plan.output_path));
            log.info("   Use --apply to execute.");
        }
        return Ok(());
    }

    let fetcher = HttpFetcher::new(&args.user_agent(), Duration::from_secs(args.timeout_secs))?;
    log.info(format!("🛒 Scraping {}", target.base));

    let harvest = pipeline::run(&fetcher, &target.base, &cfg).await;

    let path = write::save_products(&output_dir, &target.host, &harvest.products)
        .instrument(log.span_kv(&ScrapePhase::Write, [("host", target.host.clone())]))
        .await?;
    log.info_kv(
        &format!("💾 Saved {} product(s) to {}", harvest.products.len(), path.display()),
        [("path", path.display().to_string()), ("products", harvest.products.len().to_string())],
    );

    let failed = harvest.crawl.as_ref().map(|c| c.failed).unwrap_or(0);
    log.totals(harvest.strategy, harvest.products.len(), failed);

    if telemetry::config::json_mode() {
        let result = ScrapeResult {
            strategy: harvest.strategy,
            products: harvest.products.len(),
            output_path: path.display().to_string(),
            crawl: harvest.crawl,
        };
        log.result(&result, started)?;
    }
    Ok(())
}

fn build_plan(target: &Target, output_dir: &std::path::Path, cfg: &ScrapeConfig) -> ScrapePlan {
    ScrapePlan {
        base_url: target.base.clone(),
        host: target.host.clone(),
        feed_url: feed::feed_page_url(&target.base, cfg.page_size, 1),
        catalog_url: crawl::catalog_url(&target.base),
        output_path: write::output_path(output_dir, &target.host).display().to_string(),
        page_size: cfg.page_size,
        max_pages: cfg.max_pages,
        skip_feed: cfg.skip_feed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        cmd: ScrapeCmd,
    }

    #[test]
    fn flags_default_to_stock_throttle() {
        let h = Harness::try_parse_from(["shopscrape", "shop.test"]).unwrap();
        assert!(!h.cmd.apply);
        let cfg = h.cmd.scrape_config();
        assert_eq!(cfg.page_size, PAGE_SIZE);
        assert_eq!(cfg.page_delay, Duration::from_millis(DEFAULT_PAGE_DELAY_MS));
        assert_eq!(cfg.max_pages, None);
    }

    #[test]
    fn plan_lists_every_endpoint() {
        let h = Harness::try_parse_from([
            "shopscrape", "www.shop.test/", "--output-dir", "out", "--max-pages", "3", "--product-delay-ms", "0",
        ])
        .unwrap();
        let target = Target::parse(&h.cmd.url).unwrap();
        let cfg = h.cmd.scrape_config();
        let plan = build_plan(&target, &h.cmd.output_dir(), &cfg);

        assert_eq!(cfg.product_delay, Duration::ZERO);
        assert_eq!(plan.base_url, "https://www.shop.test");
        assert_eq!(plan.feed_url, "https://www.shop.test/products.json?limit=250&page=1");
        assert_eq!(plan.catalog_url, "https://www.shop.test/collections/all");
        assert_eq!(PathBuf::from(&plan.output_path), PathBuf::from("out").join("shop.test").join("products.json"));
        assert_eq!(plan.max_pages, Some(3));
    }

    #[test]
    fn explicit_user_agent_wins() {
        let h = Harness::try_parse_from(["shopscrape", "shop.test", "--user-agent", "probe/1.0"]).unwrap();
        assert_eq!(h.cmd.user_agent(), "probe/1.0");
    }

    #[tokio::test]
    async fn invalid_url_fails_before_planning() {
        let h = Harness::try_parse_from(["shopscrape", "ftp://files.test"]).unwrap();
        assert!(run(h.cmd).await.is_err());
    }
}
