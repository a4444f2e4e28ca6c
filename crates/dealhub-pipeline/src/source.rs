//! The seam between the pipeline and individual discount sources.

use async_trait::async_trait;
use dealhub_core::{RawCandidate, SourceQuery, SourceReliability};

use crate::error::SourceError;

/// One upstream provider of discount candidates.
///
/// Implementations return `Ok(vec![])` (or [`SourceError::NoResultsFound`])
/// when a query matches nothing; that is not a failure.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Identifier used for provenance, logging and budgets.
    fn id(&self) -> &str;

    fn reliability(&self) -> SourceReliability;

    /// Run one query against the source.
    async fn query(&self, query: &SourceQuery) -> Result<Vec<RawCandidate>, SourceError>;
}
