// Shape reconciliation shared by every extraction tier.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use url::Url;

use super::product::{Price, Product};

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("static regex"))
}

fn style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("static regex"))
}

fn price_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d[\d,.]*").expect("static regex"))
}

/// Drop `<script>`/`<style>` blocks and trim. Empty input stays empty.
/// Repeats until nothing matches, so removal cannot splice a new block together.
pub fn sanitize_html(s: &str) -> String {
    let mut out = s.to_string();
    loop {
        let no_script = script_re().replace_all(&out, "");
        let no_style = style_re().replace_all(&no_script, "");
        if no_style == out { break; }
        out = no_style.into_owned();
    }
    out.trim().to_string()
}

/// Make an image reference absolute. Scheme-relative becomes `https:`; relative
/// paths resolve against `base` when one is known, otherwise they are dropped.
pub fn absolutize_image_url(raw: &str, base: Option<&Url>) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() { return None; }
    if let Some(rest) = s.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    if s.starts_with("http://") || s.starts_with("https://") {
        return Some(s.to_string());
    }
    let joined = base?.join(s).ok()?;
    match joined.scheme() {
        "http" | "https" => Some(joined.to_string()),
        _ => None,
    }
}

/// Absolutize, drop empties, de-duplicate by final URL keeping first occurrence.
pub fn normalize_images<I, S>(raw: I, base: Option<&Url>) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for r in raw {
        let Some(abs) = absolutize_image_url(r.as_ref(), base) else { continue };
        if seen.insert(abs.clone()) { out.push(abs); }
    }
    out
}

fn valid_amount(v: f64) -> bool { v.is_finite() && v >= 0.0 }

/// Collapse a set of candidate prices: none → `Absent`, equal → `Fixed`, else `Range`.
/// Negative and non-finite values are ignored.
pub fn derive_price<I: IntoIterator<Item = f64>>(values: I) -> Price {
    let mut bounds: Option<(f64, f64)> = None;
    for v in values.into_iter().filter(|v| valid_amount(*v)) {
        bounds = Some(match bounds {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        });
    }
    match bounds {
        None => Price::Absent,
        Some((lo, hi)) if lo == hi => Price::Fixed(lo),
        Some((lo, hi)) => Price::Range { min: lo, max: hi },
    }
}

/// Re-establish `Price` invariants on an existing value.
pub fn reconcile_price(price: Price) -> Price {
    match price {
        Price::Absent => Price::Absent,
        Price::Fixed(v) => derive_price([v]),
        Price::Range { min, max } => derive_price([min, max]),
    }
}

/// A price as JSON: a number, or a string holding a plain decimal number.
pub fn parse_price_value(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    valid_amount(n).then_some(n)
}

/// First numeric token in display text (`"$1,299.00"`, `"Sale: €49,90"`).
///
/// Separator policy: with both `,` and `.` present the last one is the decimal
/// mark. With commas only, a single comma followed by one or two digits is a
/// decimal comma; any other comma is a thousands separator.
pub fn parse_price_token(text: &str) -> Option<f64> {
    let m = price_token_re().find(text)?;
    let tok = m.as_str().trim_end_matches([',', '.']);

    let commas = tok.matches(',').count();
    let dots = tok.matches('.').count();
    let cleaned = match (tok.rfind(','), tok.rfind('.')) {
        (Some(c), Some(d)) if c > d => tok.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => tok.replace(',', ""),
        (Some(c), None) => {
            let decimals = tok.len() - c - 1;
            if commas == 1 && (1..=2).contains(&decimals) { tok.replace(',', ".") } else { tok.replace(',', "") }
        }
        (None, Some(_)) if dots > 1 => tok.replace('.', ""),
        _ => tok.to_string(),
    };

    cleaned.parse::<f64>().ok().filter(|v| valid_amount(*v))
}

/// Apply every normalization to a record. Idempotent.
pub fn normalize_product(mut p: Product) -> Product {
    let base = Url::parse(&p.url).ok();
    p.description = sanitize_html(&p.description);
    p.images = normalize_images(&p.images, base.as_ref());
    p.price = reconcile_price(p.price);
    p
}
