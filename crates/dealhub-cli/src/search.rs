//! `search` command: one aggregate search, printed as JSON.

use std::sync::Arc;
use std::time::Duration;

use dealhub_core::{AppConfig, SearchRequest};
use dealhub_pipeline::{Aggregator, DiscountValidator, UsageTracker};

/// Build an aggregator from config and the sources file, run `request`, and
/// print the response to stdout.
///
/// # Errors
///
/// Returns an error if the sources file is invalid, an adapter cannot be
/// built, the discount bounds are invalid, or no sources are configured.
pub(crate) async fn run_search(config: &AppConfig, request: &SearchRequest) -> anyhow::Result<()> {
    let sources = dealhub_core::load_sources(&config.sources_path)?;

    let aggregator = Aggregator::builder(Arc::new(UsageTracker::default()))
        .http_sources(
            &sources.sources,
            config.source_timeout_secs,
            &config.http_user_agent,
        )?
        .validator(DiscountValidator::new(
            config.discount_floor_pct,
            config.discount_ceiling_pct,
        )?)
        .query_timeout(Duration::from_secs(config.source_timeout_secs))
        .build();

    let response = aggregator.search(request).await?;
    tracing::info!(
        total_results = response.total_results,
        sources = ?response.sources,
        "search finished"
    );

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
