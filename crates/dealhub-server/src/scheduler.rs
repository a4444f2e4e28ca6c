//! Background refresh scheduler.
//!
//! When a refresh cron is configured, a single job replays the sources file's
//! `refresh_queries` through the aggregator so the offer store stays current.
//! Refresh searches go through the same budget gating as API searches.

use std::sync::Arc;

use dealhub_core::RefreshQuery;
use dealhub_pipeline::Aggregator;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    aggregator: Arc<Aggregator>,
    cron: &str,
    queries: Vec<RefreshQuery>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_refresh_job(&scheduler, aggregator, cron, queries).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_refresh_job(
    scheduler: &JobScheduler,
    aggregator: Arc<Aggregator>,
    cron: &str,
    queries: Vec<RefreshQuery>,
) -> Result<(), JobSchedulerError> {
    let queries = Arc::new(queries);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let aggregator = Arc::clone(&aggregator);
        let queries = Arc::clone(&queries);

        Box::pin(async move {
            if queries.is_empty() {
                tracing::info!("scheduler: no refresh queries configured; skipping");
                return;
            }
            tracing::info!(queries = queries.len(), "scheduler: starting offer refresh");
            let handed_off = aggregator.refresh(&queries).await;
            tracing::info!(handed_off, "scheduler: offer refresh complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: offer refresh job registered");
    Ok(())
}
