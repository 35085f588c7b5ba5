pub mod markup;
pub mod structured;

use scraper::Html;
use url::Url;

use super::product::{PageTier, Product, ProductId};

/// Path marker shared by product links and product image assets.
pub const PRODUCT_PATH_MARKER: &str = "/products/";

/// Extract one product page: embedded metadata when present, markup heuristics otherwise.
pub fn extract_page(html: &str, url: &str) -> (Product, PageTier) {
    let doc = Html::parse_document(html);
    match structured::extract(&doc, url) {
        Some(p) => (p, PageTier::StructuredData),
        None => (markup::extract(&doc, url), PageTier::Markup),
    }
}

/// `id`/`handle` from the final path segment, query and fragment stripped.
pub fn identity_from_url(url: &str) -> (ProductId, String) {
    let handle = match Url::parse(url) {
        Ok(u) => u
            .path_segments()
            .and_then(|segs| segs.filter(|s| !s.is_empty()).last().map(str::to_string))
            .unwrap_or_default(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    (ProductId::Text(handle.clone()), handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_strips_query_and_trailing_slash() {
        let (id, handle) = identity_from_url("https://shop.test/products/blue-tee?variant=42#top");
        assert_eq!(handle, "blue-tee");
        assert_eq!(id, ProductId::Text("blue-tee".into()));
        let (_, handle) = identity_from_url("https://shop.test/products/mug/");
        assert_eq!(handle, "mug");
        let (_, handle) = identity_from_url("products/cap?x=1");
        assert_eq!(handle, "cap");
    }

    #[test]
    fn extract_page_prefers_structured_data() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"Product","name":"LD Name"}</script>
            </head><body><h1>Markup Name</h1></body></html>"#;
        let (p, tier) = extract_page(html, "https://shop.test/products/x");
        assert_eq!(tier, PageTier::StructuredData);
        assert_eq!(p.title, "LD Name");
    }

    #[test]
    fn extract_page_falls_back_to_markup() {
        let html = r#"<html><body><h1>Markup Name</h1></body></html>"#;
        let (p, tier) = extract_page(html, "https://shop.test/products/x");
        assert_eq!(tier, PageTier::Markup);
        assert_eq!(p.title, "Markup Name");
        assert!(p.variants.is_none());
    }
}
