use std::time::Duration;

/// Largest page the `/products.json` endpoint serves.
pub const PAGE_SIZE: usize = 250;

pub const DEFAULT_ENTRY_DELAY_MS: u64 = 50;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 1000;
pub const DEFAULT_PRODUCT_DELAY_MS: u64 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Pagination bound and throttle intervals for one run.
#[derive(Clone, Debug)]
pub struct ScrapeConfig {
    pub page_size: usize,
    /// Applied after every feed entry.
    pub entry_delay: Duration,
    /// Applied between feed page requests.
    pub page_delay: Duration,
    /// Applied between product page requests while crawling.
    pub product_delay: Duration,
    pub max_pages: Option<usize>,
    pub skip_feed: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            entry_delay: Duration::from_millis(DEFAULT_ENTRY_DELAY_MS),
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
            product_delay: Duration::from_millis(DEFAULT_PRODUCT_DELAY_MS),
            max_pages: None,
            skip_feed: false,
        }
    }
}

impl ScrapeConfig {
    #[cfg(test)]
    pub fn unthrottled() -> Self {
        Self {
            entry_delay: Duration::ZERO,
            page_delay: Duration::ZERO,
            product_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
