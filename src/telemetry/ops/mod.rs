pub mod scrape;
pub mod inspect;
