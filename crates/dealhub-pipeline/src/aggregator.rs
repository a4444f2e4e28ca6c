//! Fan-out search across every configured source.
//!
//! One call queries each source that still has budget, concurrently and under
//! a per-query timeout. Candidates are validated and scored per source, then
//! merged, deduplicated, filtered, sorted and truncated. A failing source only
//! costs its own contribution.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dealhub_core::{
    normalize_limit, Clock, RawCandidate, RefreshQuery, SearchFilters, SearchRequest,
    SearchResponse, SourceConfig, SourceQuery, SystemClock, ValidatedOffer, MAX_LIMIT,
};
use futures::future::join_all;
use rust_decimal::Decimal;

use crate::dedup::dedupe;
use crate::error::{AggregateError, SourceError};
use crate::http_source::HttpSourceAdapter;
use crate::normalize::{canonical_id, make_dedup_key, normalize_name};
use crate::ranking::sort_offers;
use crate::scorer::{score, SourceTrust};
use crate::source::SourceAdapter;
use crate::store::OfferSink;
use crate::usage::UsageTracker;
use crate::validator::DiscountValidator;

/// Per-query timeout used when none is configured.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(20);

struct RegisteredSource {
    adapter: Arc<dyn SourceAdapter>,
    trust: SourceTrust,
}

impl RegisteredSource {
    fn id(&self) -> &str {
        self.adapter.id()
    }
}

pub struct Aggregator {
    sources: Vec<RegisteredSource>,
    usage: Arc<UsageTracker>,
    validator: DiscountValidator,
    query_timeout: Duration,
    sink: Option<Arc<dyn OfferSink>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("sources", &self.source_ids())
            .field("validator", &self.validator)
            .field("query_timeout", &self.query_timeout)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Aggregator`]. Registering a source also registers its daily
/// budget with the shared [`UsageTracker`].
pub struct AggregatorBuilder {
    sources: Vec<RegisteredSource>,
    usage: Arc<UsageTracker>,
    validator: DiscountValidator,
    query_timeout: Duration,
    sink: Option<Arc<dyn OfferSink>>,
    clock: Arc<dyn Clock>,
}

impl AggregatorBuilder {
    #[must_use]
    pub fn source(
        mut self,
        adapter: Arc<dyn SourceAdapter>,
        daily_limit: u32,
        base_score: Option<u8>,
    ) -> Self {
        self.usage.register(adapter.id(), daily_limit);
        let trust = SourceTrust {
            reliability: adapter.reliability(),
            base_override: base_score,
        };
        self.sources.push(RegisteredSource { adapter, trust });
        self
    }

    /// Register one [`HttpSourceAdapter`] per sources-file entry, in file order.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::SourceSetup`] if an adapter cannot be built.
    pub fn http_sources(
        mut self,
        configs: &[SourceConfig],
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, AggregateError> {
        for config in configs {
            let adapter = HttpSourceAdapter::from_config(config, timeout_secs, user_agent)?;
            self = self.source(Arc::new(adapter), config.daily_limit, config.base_score);
        }
        Ok(self)
    }

    #[must_use]
    pub fn validator(mut self, validator: DiscountValidator) -> Self {
        self.validator = validator;
        self
    }

    #[must_use]
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn OfferSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn build(self) -> Aggregator {
        Aggregator {
            sources: self.sources,
            usage: self.usage,
            validator: self.validator,
            query_timeout: self.query_timeout,
            sink: self.sink,
            clock: self.clock,
        }
    }
}

impl Aggregator {
    #[must_use]
    pub fn builder(usage: Arc<UsageTracker>) -> AggregatorBuilder {
        AggregatorBuilder {
            sources: Vec::new(),
            usage,
            validator: DiscountValidator::default(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            sink: None,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    #[must_use]
    pub fn sink(&self) -> Option<&Arc<dyn OfferSink>> {
        self.sink.as_ref()
    }

    /// Configured source ids, in query order.
    #[must_use]
    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.iter().map(RegisteredSource::id).collect()
    }

    /// Run one aggregate search.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::NoSourcesConfigured`] when the aggregator has
    /// no sources at all. Every per-source failure is logged and absorbed.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, AggregateError> {
        if self.sources.is_empty() {
            return Err(AggregateError::NoSourcesConfigured);
        }

        let query = SourceQuery {
            brand: request.filters.brand.clone(),
            category: request.filters.category.clone(),
            ..SourceQuery::new(request.query.trim())
        };

        let eligible: Vec<&RegisteredSource> = self
            .sources
            .iter()
            .filter(|source| {
                let allowed = self.usage.may_query(source.id());
                if !allowed {
                    tracing::info!(source = source.id(), "daily budget exhausted, skipping source");
                }
                allowed
            })
            .collect();

        let outcomes = join_all(
            eligible
                .iter()
                .map(|source| self.query_source(source, &query)),
        )
        .await;

        let fetched_at = self.clock.now();
        let mut contributing = Vec::with_capacity(eligible.len());
        let mut offers = Vec::new();

        for (source, outcome) in eligible.iter().zip(outcomes) {
            match outcome {
                Ok(candidates) => {
                    tracing::debug!(
                        source = source.id(),
                        count = candidates.len(),
                        "source returned candidates"
                    );
                    contributing.push(source.id().to_string());
                    offers.extend(self.admit(source, candidates, &request.filters, fetched_at));
                }
                Err(SourceError::NoResultsFound { .. }) => {
                    contributing.push(source.id().to_string());
                }
                Err(SourceError::BudgetExhausted(e)) => {
                    tracing::info!(source = source.id(), error = %e, "source skipped");
                }
                Err(e) => {
                    tracing::warn!(source = source.id(), error = %e, "source query failed");
                }
            }
        }

        let mut offers = dedupe(offers);
        offers.retain(|offer| request.filters.matches(offer));
        sort_offers(&mut offers, request.sort, &request.query);
        let total_results = offers.len();
        offers.truncate(normalize_limit(request.limit));

        self.hand_off(&offers).await;

        tracing::info!(
            query = %request.query,
            sources = contributing.len(),
            total_results,
            returned = offers.len(),
            "aggregate search complete"
        );

        Ok(SearchResponse {
            offers,
            sources: contributing,
            total_results,
        })
    }

    /// Replay `queries` so the sink receives fresh offers.
    ///
    /// Returns the number of offers handed off across all queries. A failing
    /// query is logged and the rest still run.
    pub async fn refresh(&self, queries: &[RefreshQuery]) -> usize {
        let mut handed_off = 0;
        for refresh in queries {
            let request = SearchRequest {
                query: refresh.query.clone(),
                filters: SearchFilters {
                    brand: refresh.brand.clone(),
                    category: refresh.category.clone(),
                    ..SearchFilters::default()
                },
                limit: Some(MAX_LIMIT),
                ..SearchRequest::default()
            };
            match self.search(&request).await {
                Ok(response) => handed_off += response.offers.len(),
                Err(e) => {
                    tracing::warn!(query = %refresh.query, error = %e, "refresh query failed");
                }
            }
        }
        handed_off
    }

    async fn query_source(
        &self,
        source: &RegisteredSource,
        query: &SourceQuery,
    ) -> Result<Vec<RawCandidate>, SourceError> {
        // Counted before the call: a timeout or failure still spends budget.
        self.usage.record_query(source.id())?;

        match tokio::time::timeout(self.query_timeout, source.adapter.query(query)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::timeout(source.id(), self.query_timeout)),
        }
    }

    fn admit(
        &self,
        source: &RegisteredSource,
        candidates: Vec<RawCandidate>,
        filters: &SearchFilters,
        fetched_at: DateTime<Utc>,
    ) -> Vec<ValidatedOffer> {
        let queried_brand = filters.brand.as_deref();
        let mut admitted = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let discount = match self
                .validator
                .validate(candidate.original_price, candidate.sale_price)
            {
                Ok(discount) => discount,
                Err(reason) => {
                    tracing::debug!(
                        source = source.id(),
                        name = %candidate.name,
                        reason = %reason,
                        "candidate rejected"
                    );
                    continue;
                }
            };

            if let Some(reported) = candidate.reported_discount_pct {
                if reported.round() != Decimal::from(discount) {
                    tracing::debug!(
                        source = source.id(),
                        name = %candidate.name,
                        reported = %reported,
                        recomputed = discount,
                        "source-reported discount disagrees with prices"
                    );
                }
            }

            let confidence = match score(&candidate, source.trust, queried_brand) {
                Ok(confidence) => confidence,
                Err(quarantined) => {
                    tracing::debug!(
                        source = source.id(),
                        name = %candidate.name,
                        score = quarantined.score,
                        "candidate quarantined"
                    );
                    continue;
                }
            };

            if let Some(offer) =
                build_offer(candidate, source.id(), discount, confidence, fetched_at)
            {
                admitted.push(offer);
            }
        }

        admitted
    }

    async fn hand_off(&self, offers: &[ValidatedOffer]) {
        let Some(sink) = &self.sink else {
            return;
        };
        if offers.is_empty() {
            return;
        }
        match sink.upsert_offers(offers).await {
            Ok(written) => tracing::debug!(written, "offers handed off"),
            Err(e) => tracing::warn!(error = %e, "offer hand-off failed"),
        }
    }
}

fn build_offer(
    candidate: RawCandidate,
    source_id: &str,
    discount_percentage: u8,
    confidence_score: u8,
    fetched_at: DateTime<Utc>,
) -> Option<ValidatedOffer> {
    // Both prices are present once validation has passed.
    let (Some(original_price), Some(sale_price)) = (candidate.original_price, candidate.sale_price)
    else {
        return None;
    };

    // A source's own capture time wins, but never one from the future.
    let scraped_at = candidate
        .scraped_at
        .map_or(fetched_at, |at| at.min(fetched_at));

    let normalized_name = normalize_name(&candidate.name);
    let dedup_key = make_dedup_key(
        candidate.product_url.as_deref(),
        candidate.brand.as_deref(),
        &normalized_name,
        sale_price,
    );

    Some(ValidatedOffer {
        id: canonical_id(&dedup_key),
        dedup_key,
        name: candidate.name,
        normalized_name,
        brand: candidate.brand,
        category: candidate.category,
        original_price,
        sale_price,
        currency: candidate.currency,
        image_url: candidate.image_url,
        product_url: candidate.product_url,
        source: source_id.to_string(),
        external_id: candidate.external_id,
        discount_percentage,
        confidence_score,
        scraped_at,
        created_at: scraped_at,
    })
}
