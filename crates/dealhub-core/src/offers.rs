use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// How much a source's data can be trusted before looking at the record itself.
///
/// Structured product-data APIs return typed prices; scraped pages are parsed
/// heuristically and are wrong more often.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceReliability {
    StructuredApi,
    ScrapedHtml,
}

impl std::fmt::Display for SourceReliability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceReliability::StructuredApi => write!(f, "structured_api"),
            SourceReliability::ScrapedHtml => write!(f, "scraped_html"),
        }
    }
}

/// What a single source is asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceQuery {
    pub query: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl SourceQuery {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            brand: None,
            category: None,
            page: 1,
            page_size: 50,
        }
    }
}

/// An unvalidated discount listing exactly as one source reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Claimed pre-discount price.
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub product_url: Option<String>,
    /// Filled in by the adapter that produced the record.
    #[serde(default)]
    pub source: String,
    /// Catalog identifier such as a SKU or ASIN.
    #[serde(default)]
    pub external_id: Option<String>,
    /// Discount as advertised by the source. Never used for validation; the
    /// percentage is always recomputed from the two prices. Accepts numbers
    /// and strings like `"30%"`; anything else reads as `None`.
    #[serde(default, deserialize_with = "lenient_percentage")]
    pub reported_discount_pct: Option<Decimal>,
    /// When the source captured the listing. Unparseable values read as `None`.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub scraped_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(Decimal),
    Text(String),
    Other(#[allow(dead_code)] IgnoredAny),
}

fn lenient_percentage<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Number(value)) => Some(value),
        Some(Loose::Text(text)) => text.trim().trim_end_matches('%').trim_end().parse().ok(),
        Some(Loose::Other(_)) | None => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(text)) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|at| at.with_timezone(&Utc)),
        Some(Loose::Number(_) | Loose::Other(_)) | None => None,
    })
}

fn default_currency() -> String {
    "EUR".to_string()
}

/// Canonical identity of a listing across sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DedupKey(pub String);

impl DedupKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DedupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A candidate that passed discount validation and confidence scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedOffer {
    /// Stable across requests: derived from `dedup_key`.
    pub id: String,
    pub dedup_key: DedupKey,
    pub name: String,
    pub normalized_name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub original_price: Decimal,
    pub sale_price: Decimal,
    pub currency: String,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub source: String,
    pub external_id: Option<String>,
    /// Recomputed from the two prices, 0–100.
    pub discount_percentage: u8,
    /// 70–99 for every surfaced offer.
    pub confidence_score: u8,
    pub scraped_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
