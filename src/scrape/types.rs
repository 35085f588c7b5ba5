use serde::Serialize;

use super::crawl::CrawlOutcome;
use super::pipeline::Strategy;

// Plan envelope types
#[derive(Debug, Serialize)]
pub struct ScrapePlan {
    pub base_url: String,
    pub host: String,
    pub feed_url: String,
    pub catalog_url: String,
    pub output_path: String,
    pub page_size: usize,
    pub max_pages: Option<usize>,
    pub skip_feed: bool,
}

// Apply/result envelope types
#[derive(Debug, Serialize)]
pub struct ScrapeResult {
    pub strategy: Strategy,
    pub products: usize,
    pub output_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crawl: Option<CrawlOutcome>,
}
