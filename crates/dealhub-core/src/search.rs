use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::offers::ValidatedOffer;

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 200;

/// Clamp a caller-supplied result limit into `[1, MAX_LIMIT]`.
#[must_use]
pub fn normalize_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Price,
    #[default]
    Discount,
    Popularity,
    /// Newest capture first. Listings without a source-reported capture time
    /// count as fetched at search time.
    Date,
    Relevance,
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortField::Price => write!(f, "price"),
            SortField::Discount => write!(f, "discount"),
            SortField::Popularity => write!(f, "popularity"),
            SortField::Date => write!(f, "date"),
            SortField::Relevance => write!(f, "relevance"),
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(SortField::Price),
            "discount" => Ok(SortField::Discount),
            "popularity" => Ok(SortField::Popularity),
            "date" => Ok(SortField::Date),
            "relevance" => Ok(SortField::Relevance),
            other => Err(format!(
                "unknown sort field '{other}'; expected one of price, discount, popularity, date, relevance"
            )),
        }
    }
}

/// Caller-side predicates applied after deduplication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub brand: Option<String>,
    pub category: Option<String>,
    /// Inclusive ceiling on the sale price.
    pub max_price: Option<Decimal>,
    /// Inclusive minimum discount percentage.
    pub min_discount: Option<u8>,
}

impl SearchFilters {
    /// Returns `true` when `offer` satisfies every filter that is set.
    #[must_use]
    pub fn matches(&self, offer: &ValidatedOffer) -> bool {
        let brand_ok = self.brand.as_deref().is_none_or(|wanted| {
            offer
                .brand
                .as_deref()
                .is_some_and(|b| b.trim().eq_ignore_ascii_case(wanted.trim()))
        });
        let category_ok = self.category.as_deref().is_none_or(|wanted| {
            offer
                .category
                .as_deref()
                .is_some_and(|c| c.trim().eq_ignore_ascii_case(wanted.trim()))
        });
        let price_ok = self.max_price.is_none_or(|max| offer.sale_price <= max);
        let discount_ok = self
            .min_discount
            .is_none_or(|min| offer.discount_percentage >= min);

        brand_ok && category_ok && price_ok && discount_ok
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub filters: SearchFilters,
    pub sort: SortField,
    pub limit: Option<usize>,
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub offers: Vec<ValidatedOffer>,
    /// Sources whose query completed, in query order.
    pub sources: Vec<String>,
    /// Matching offers before the limit was applied.
    pub total_results: usize,
}
