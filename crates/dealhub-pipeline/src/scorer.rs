//! Confidence scoring for validated candidates.
//!
//! Starts from the source's reliability tier, then rewards complete records and
//! penalises gaps. Anything that lands below [`SURFACE_THRESHOLD`] is
//! quarantined; everything else is clamped into `70..=99`.

use dealhub_core::{RawCandidate, SourceReliability};
use rust_decimal::Decimal;

use crate::error::Quarantined;

pub const SURFACE_THRESHOLD: i32 = 70;
pub const MAX_SCORE: i32 = 99;

const STRUCTURED_API_BASE: i32 = 88;
const SCRAPED_HTML_BASE: i32 = 78;

const IMAGE_BONUS: i32 = 3;
const EXTERNAL_ID_BONUS: i32 = 3;
const PLAUSIBLE_PRICE_BONUS: i32 = 2;
const MISSING_FIELD_PENALTY: i32 = 4;
const BRAND_MISMATCH_PENALTY: i32 = 12;

/// Sale prices outside this range are more often parse errors than real prices.
const PLAUSIBLE_PRICE_MIN: i64 = 1;
const PLAUSIBLE_PRICE_MAX: i64 = 50_000;

/// Starting score for a reliability tier.
#[must_use]
pub fn base_score(reliability: SourceReliability) -> i32 {
    match reliability {
        SourceReliability::StructuredApi => STRUCTURED_API_BASE,
        SourceReliability::ScrapedHtml => SCRAPED_HTML_BASE,
    }
}

/// How much a given source starts out being trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceTrust {
    pub reliability: SourceReliability,
    /// Replaces the tier default when set.
    pub base_override: Option<u8>,
}

impl SourceTrust {
    #[must_use]
    pub fn new(reliability: SourceReliability) -> Self {
        Self {
            reliability,
            base_override: None,
        }
    }

    fn base(self) -> i32 {
        self.base_override
            .map_or_else(|| base_score(self.reliability), i32::from)
    }
}

/// Score `candidate`.
///
/// `queried_brand` is the brand the caller searched for; a candidate whose
/// name does not mention it is penalised.
///
/// # Errors
///
/// Returns [`Quarantined`] with the raw score when it is below
/// [`SURFACE_THRESHOLD`].
pub fn score(
    candidate: &RawCandidate,
    trust: SourceTrust,
    queried_brand: Option<&str>,
) -> Result<u8, Quarantined> {
    let raw = raw_score(candidate, trust, queried_brand);
    if raw < SURFACE_THRESHOLD {
        return Err(Quarantined { score: raw });
    }
    // Clamped to 70..=99, always fits in u8.
    Ok(u8::try_from(raw.min(MAX_SCORE)).unwrap_or(u8::MAX))
}

fn raw_score(candidate: &RawCandidate, trust: SourceTrust, queried_brand: Option<&str>) -> i32 {
    let mut score = trust.base();

    if is_present(candidate.image_url.as_deref()) {
        score += IMAGE_BONUS;
    }
    if is_present(candidate.external_id.as_deref()) {
        score += EXTERNAL_ID_BONUS;
    }
    if candidate.sale_price.is_some_and(is_plausible_price) {
        score += PLAUSIBLE_PRICE_BONUS;
    }

    for optional in [
        candidate.brand.as_deref(),
        candidate.category.as_deref(),
        candidate.product_url.as_deref(),
    ] {
        if !is_present(optional) {
            score -= MISSING_FIELD_PENALTY;
        }
    }

    if let Some(brand) = queried_brand.map(str::trim).filter(|b| !b.is_empty()) {
        if !candidate
            .name
            .to_lowercase()
            .contains(&brand.to_lowercase())
        {
            score -= BRAND_MISMATCH_PENALTY;
        }
    }

    score
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn is_plausible_price(price: Decimal) -> bool {
    price >= Decimal::from(PLAUSIBLE_PRICE_MIN) && price <= Decimal::from(PLAUSIBLE_PRICE_MAX)
}
