use std::time::Duration;

use thiserror::Error;

/// Why a single source could not contribute to an aggregate call.
///
/// Every variant is isolated to the source that raised it.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source {source_id} timed out after {timeout_ms}ms")]
    Timeout { source_id: String, timeout_ms: u64 },

    #[error("source {source_id} blocked the request: {reason}")]
    BlockedByTarget { source_id: String, reason: String },

    /// The source answered and had nothing. Treated as an empty result.
    #[error("source {source_id} found no results")]
    NoResultsFound { source_id: String },

    #[error("malformed response from {source_id}: {reason}")]
    MalformedResponse { source_id: String, reason: String },

    #[error("unexpected HTTP status {status} from {source_id}")]
    UnexpectedStatus { source_id: String, status: u16 },

    #[error("HTTP error from {source_id}: {source}")]
    Http {
        source_id: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0}")]
    BudgetExhausted(#[from] BudgetExhausted),
}

impl SourceError {
    pub(crate) fn timeout(source_id: &str, after: Duration) -> Self {
        Self::Timeout {
            source_id: source_id.to_owned(),
            timeout_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// The source's daily request budget has been used up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("daily budget exhausted for {source_id} ({daily_limit} requests)")]
pub struct BudgetExhausted {
    pub source_id: String,
    pub daily_limit: u32,
}

/// Why a candidate's claimed discount was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("original or sale price missing or non-positive")]
    MissingPrice,

    #[error("sale price is not below the original price")]
    NotADiscount,

    #[error("discount of {discount}% is below the {floor}% floor")]
    DiscountTooSmall { discount: u8, floor: u8 },

    #[error("discount of {discount}% exceeds the {ceiling}% ceiling")]
    DiscountImplausible { discount: u8, ceiling: u8 },
}

/// The candidate's confidence fell below the surfacing threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("confidence score {score} is below the surfacing threshold")]
pub struct Quarantined {
    pub score: i32,
}

/// Fatal errors for a whole aggregate call.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("no sources are configured")]
    NoSourcesConfigured,

    #[error("invalid discount bounds: floor {floor}% / ceiling {ceiling}%")]
    InvalidDiscountBounds { floor: u8, ceiling: u8 },

    #[error("failed to set up source: {0}")]
    SourceSetup(#[from] SourceError),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("offer store unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_second_timeout_keeps_its_precision() {
        let err = SourceError::timeout("fast-api", Duration::from_millis(250));
        assert!(matches!(err, SourceError::Timeout { timeout_ms: 250, .. }));
        assert_eq!(err.to_string(), "source fast-api timed out after 250ms");
    }
}
