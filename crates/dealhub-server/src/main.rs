mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use dealhub_core::{Clock, SystemClock};
use dealhub_pipeline::{Aggregator, DiscountValidator, MemoryOfferStore, UsageTracker};
use dealhub_translate::Translator;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(dealhub_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let sources = dealhub_core::load_sources(&config.sources_path)?;
    tracing::info!(
        env = %config.env,
        sources = sources.sources.len(),
        path = %config.sources_path.display(),
        "loaded sources file"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let usage = Arc::new(UsageTracker::new(Arc::clone(&clock)));
    let store = Arc::new(MemoryOfferStore::new(Arc::clone(&clock)));

    let aggregator = Arc::new(
        Aggregator::builder(usage)
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
            .sink(store)
            .clock(Arc::clone(&clock))
            .build(),
    );
    let translator = Arc::new(Translator::from_config(&config, clock)?);

    let _scheduler = match &config.refresh_cron {
        Some(cron) => Some(
            scheduler::build_scheduler(
                Arc::clone(&aggregator),
                cron,
                sources.refresh_queries.clone(),
            )
            .await?,
        ),
        None => {
            tracing::info!("DEALHUB_REFRESH_CRON not set; background refresh disabled");
            None
        }
    };

    let app = build_app(
        AppState {
            aggregator,
            translator,
        },
        default_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "dealhub server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
