use std::borrow::Cow;
use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::scrape::normalize::{normalize_images, normalize_product, parse_price_token, sanitize_html};
use crate::scrape::product::{Price, Product};

use super::{identity_from_url, PRODUCT_PATH_MARKER};

/// What to read out of a matched element.
#[derive(Copy, Clone, Debug)]
pub enum Read { Text, InnerHtml }

/// One entry of a priority chain. Chains are evaluated in order; first usable value wins.
#[derive(Copy, Clone, Debug)]
pub struct Rule {
    pub selector: &'static str,
    pub read: Read,
}

const fn text(selector: &'static str) -> Rule { Rule { selector, read: Read::Text } }
const fn inner(selector: &'static str) -> Rule { Rule { selector, read: Read::InnerHtml } }

pub const TITLE_RULES: &[Rule] = &[
    text("h1.product-title"),
    text("h1.product__title"),
    text(".product-single__title"),
    text(".product__title"),
    text("[itemprop=\"name\"]"),
    text("h1"),
];

pub const DESCRIPTION_RULES: &[Rule] = &[
    inner(".product-description"),
    inner(".product__description"),
    inner(".product-single__description"),
    inner("[itemprop=\"description\"]"),
    inner(".rte"),
];

pub const PRICE_RULES: &[Rule] = &[
    text(".price__current"),
    text(".product__price"),
    text(".product-price"),
    text("[itemprop=\"price\"]"),
    text(".price-item--sale"),
    text(".price"),
    text(".money"),
];

fn size_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_\d+x\d+(\.[A-Za-z0-9]+)((?:[?#].*)?)$").expect("static regex"))
}

/// Best-effort record from visual markup. Never fails; missing fields stay empty.
pub fn extract(doc: &Html, url: &str) -> Product {
    let (id, handle) = identity_from_url(url);
    let base = Url::parse(url).ok();

    let title = first_match(doc, TITLE_RULES, |s| {
        let t = collapse_whitespace(&s);
        (!t.is_empty()).then_some(t)
    })
    .unwrap_or_default();

    let description = first_match(doc, DESCRIPTION_RULES, |s| {
        let d = sanitize_html(&s);
        (!d.is_empty()).then_some(d)
    })
    .unwrap_or_default();

    normalize_product(Product {
        id,
        handle,
        title,
        description,
        price: extract_price(doc),
        images: extract_images(doc, base.as_ref()),
        url: url.to_string(),
        variants: None,
        timestamp: Utc::now(),
    })
}

/// Price from the display chain; `Absent` when no rule yields a number.
pub fn extract_price(doc: &Html) -> Price {
    match first_match(doc, PRICE_RULES, |s| parse_price_token(&s)) {
        Some(v) => Price::Fixed(v),
        None => Price::Absent,
    }
}

/// Product images: `data-src` over `src`, product assets only, full-size, absolute, unique.
pub fn extract_images(doc: &Html, base: Option<&Url>) -> Vec<String> {
    let Ok(sel) = Selector::parse("img") else { return Vec::new() };
    let raw: Vec<String> = doc
        .select(&sel)
        .filter_map(|img| {
            let el = img.value();
            let product_asset = |attr: &str| {
                el.attr(attr).map(str::trim).filter(|s| !s.is_empty() && s.contains(PRODUCT_PATH_MARKER))
            };
            product_asset("data-src").or_else(|| product_asset("src"))
        })
        .map(|src| strip_size_suffix(src).into_owned())
        .collect();
    normalize_images(raw, base)
}

/// `a_600x400.jpg` → `a.jpg`. Only the file name is touched; query and fragment are kept.
pub fn strip_size_suffix(src: &str) -> Cow<'_, str> {
    size_suffix_re().replace(src, "${1}${2}")
}

/// Walk `rules` in order; for each, only the first matching element is considered.
fn first_match<T>(doc: &Html, rules: &[Rule], accept: impl Fn(String) -> Option<T>) -> Option<T> {
    for rule in rules {
        let Ok(sel) = Selector::parse(rule.selector) else { continue };
        let Some(node) = doc.select(&sel).next() else { continue };
        if let Some(v) = accept(read(node, rule.read)) {
            return Some(v);
        }
    }
    None
}

fn read(node: ElementRef<'_>, how: Read) -> String {
    match how {
        Read::Text => node.text().collect::<String>(),
        Read::InnerHtml => node.inner_html(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://shop.test/products/linen-shirt?variant=9";

    fn doc(body: &str) -> Html { Html::parse_document(&format!("<html><body>{}</body></html>", body)) }

    #[test]
    fn specific_title_selector_beats_generic_heading() {
        let d = doc(r#"<h1>Store Name</h1><div class="product-single__title"> Linen
            Shirt </div>"#);
        let p = extract(&d, URL);
        assert_eq!(p.title, "Linen Shirt");
        assert_eq!(p.handle, "linen-shirt");
    }

    #[test]
    fn title_falls_back_to_h1() {
        let p = extract(&doc("<h1>Plain Heading</h1>"), URL);
        assert_eq!(p.title, "Plain Heading");
    }

    #[test]
    fn empty_candidates_are_skipped() {
        let d = doc(r#"<h1 class="product-title">  </h1><h2 class="product__title">Second</h2>"#);
        assert_eq!(extract(&d, URL).title, "Second");
    }

    #[test]
    fn description_is_sanitized_inner_html() {
        let d = doc(r#"<div class="rte">generic</div>
            <div class="product__description"><style>p{}</style><p>Breathable linen.</p><script>track()</script></div>"#);
        assert_eq!(extract(&d, URL).description, "<p>Breathable linen.</p>");
    }

    #[test]
    fn price_strips_thousands_separators() {
        let d = doc(r#"<span class="product__price">$1,299.00</span>"#);
        assert_eq!(extract_price(&d), Price::Fixed(1299.00));
    }

    #[test]
    fn price_uses_decimal_comma_policy() {
        let d = doc(r#"<span class="price">Sale: €49,90</span>"#);
        assert_eq!(extract_price(&d), Price::Fixed(49.90));
    }

    #[test]
    fn price_rule_without_number_falls_through() {
        let d = doc(r#"<span class="price__current">Sold out</span><span class="money">$12</span>"#);
        assert_eq!(extract_price(&d), Price::Fixed(12.0));
    }

    #[test]
    fn missing_price_is_absent() {
        assert_eq!(extract_price(&doc("<p>no price here</p>")), Price::Absent);
    }

    #[test]
    fn images_prefer_data_src_and_recover_full_size() {
        let d = doc(r#"
            <img src="//cdn.shop.test/s/files/products/a_100x100.jpg" data-src="//cdn.shop.test/s/files/products/a_600x600.jpg?v=1">
            <img src="//cdn.shop.test/s/files/products/a.jpg?v=1">
            <img src="https://cdn.shop.test/s/files/logo.png">
            <img src="/cdn/shop/products/b_50x50.png">
        "#);
        let base = Url::parse(URL).unwrap();
        let imgs = extract_images(&d, Some(&base));
        assert_eq!(
            imgs,
            vec![
                "https://cdn.shop.test/s/files/products/a.jpg?v=1".to_string(),
                "https://shop.test/cdn/shop/products/b.png".to_string(),
            ]
        );
    }

    #[test]
    fn size_suffix_only_before_extension() {
        assert_eq!(strip_size_suffix("x/products/shoe_1024x768.webp"), "x/products/shoe.webp");
        assert_eq!(strip_size_suffix("x/products/shoe_1024x768_b.webp"), "x/products/shoe_1024x768_b.webp");
        assert_eq!(strip_size_suffix("x/products/shoe_20x20.jpg?v=3#top"), "x/products/shoe.jpg?v=3#top");
    }

    #[test]
    fn size_token_in_directory_is_left_alone() {
        let src = "https://cdn.test/files/v_1x2.3/products/shoe.jpg";
        assert_eq!(strip_size_suffix(src), src);
        assert_eq!(
            strip_size_suffix("https://cdn_1x2.io/products/shoe_300x300.jpg"),
            "https://cdn_1x2.io/products/shoe.jpg"
        );
    }

    #[test]
    fn placeholder_data_src_does_not_hide_product_src() {
        let d = doc(r#"
            <img data-src="//cdn.shop.test/assets/lazy-placeholder.gif" src="//cdn.shop.test/s/files/products/c.jpg">
            <img data-src="  " src="//cdn.shop.test/s/files/products/d.jpg">
        "#);
        let base = Url::parse(URL).unwrap();
        assert_eq!(
            extract_images(&d, Some(&base)),
            vec![
                "https://cdn.shop.test/s/files/products/c.jpg".to_string(),
                "https://cdn.shop.test/s/files/products/d.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn markup_record_has_no_variants() {
        let p = extract(&doc("<h1>T</h1>"), URL);
        assert!(p.variants.is_none());
        assert_eq!(p.price, Price::Absent);
        assert!(p.images.is_empty());
        assert_eq!(p.description, "");
    }
}
