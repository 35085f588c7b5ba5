use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Identifier as the source provides it: numeric ids from the feed, URL slugs elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Int(u64),
    Text(String),
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductId::Int(n) => write!(f, "{}", n),
            ProductId::Text(s) => f.write_str(s),
        }
    }
}

/// Reconciled price shape. Serializes as `null`, a bare number, or `{"min","max"}`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Price {
    #[default]
    Absent,
    Fixed(f64),
    Range { min: f64, max: f64 },
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Price::Absent => serializer.serialize_none(),
            Price::Fixed(v) => serializer.serialize_f64(*v),
            Price::Range { min, max } => {
                let mut st = serializer.serialize_struct("PriceRange", 2)?;
                st.serialize_field("min", min)?;
                st.serialize_field("max", max)?;
                st.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub id: Option<ProductId>,
    pub title: String,
    pub price: Option<f64>,
    pub sku: Option<String>,
}

/// Canonical output record, produced once by exactly one tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub handle: String,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub images: Vec<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<Variant>>,
    pub timestamp: DateTime<Utc>,
}

/// Which tier produced a page-sourced record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageTier { StructuredData, Markup }
