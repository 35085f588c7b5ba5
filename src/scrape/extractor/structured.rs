use chrono::Utc;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::scrape::normalize::{normalize_product, parse_price_value, sanitize_html};
use crate::scrape::product::{Price, Product};

use super::{identity_from_url, markup};

/// Record from an embedded schema.org `Product` block, or `None` when the page has none.
pub fn extract(doc: &Html, url: &str) -> Option<Product> {
    let node = find_product_node(doc)?;
    let (id, handle) = identity_from_url(url);

    let title = node.get("name").and_then(Value::as_str).unwrap_or("").trim().to_string();
    let description = node.get("description").and_then(Value::as_str).map(sanitize_html).unwrap_or_default();
    let price = match node.get("offers").and_then(offer_price) {
        Some(v) => Price::Fixed(v),
        None => markup::extract_price(doc),
    };
    let images = node.get("image").map(image_values).unwrap_or_default();

    Some(normalize_product(Product {
        id,
        handle,
        title,
        description,
        price,
        images,
        url: url.to_string(),
        variants: None,
        timestamp: Utc::now(),
    }))
}

/// Last `Product` entity across all JSON-LD blocks. Unparseable blocks are skipped.
pub fn find_product_node(doc: &Html) -> Option<Value> {
    let sel = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    let mut last = None;
    for script in doc.select(&sel) {
        let raw = script.text().collect::<String>();
        let Some(value) = parse_block(&raw) else { continue };
        collect_products(&value, &mut last);
    }
    last
}

fn parse_block(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if raw.is_empty() { return None; }
    serde_json::from_str(raw).ok()
}

fn collect_products(v: &Value, last: &mut Option<Value>) {
    match v {
        Value::Array(items) => items.iter().for_each(|i| collect_products(i, last)),
        Value::Object(map) => {
            if is_product(v) { *last = Some(v.clone()); }
            if let Some(graph) = map.get("@graph") { collect_products(graph, last); }
        }
        _ => {}
    }
}

fn is_product(v: &Value) -> bool {
    match v.get("@type") {
        Some(Value::String(t)) => t == "Product",
        Some(Value::Array(ts)) => ts.iter().any(|t| t.as_str() == Some("Product")),
        _ => false,
    }
}

/// `offers.price`, else `offers.lowPrice`. A list of offers uses its first entry.
fn offer_price(offers: &Value) -> Option<f64> {
    let offer = match offers {
        Value::Array(list) => list.first()?,
        other => other,
    };
    offer.get("price").and_then(parse_price_value)
        .or_else(|| offer.get("lowPrice").and_then(parse_price_value))
}

/// `image` as a string, a list, or an `ImageObject`; always a sequence.
fn image_values(v: &Value) -> Vec<String> {
    match v {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(image_values).collect(),
        Value::Object(map) => map.get("url").and_then(Value::as_str).map(|s| vec![s.to_string()]).unwrap_or_default(),
        _ => Vec::new(),
    }
}
