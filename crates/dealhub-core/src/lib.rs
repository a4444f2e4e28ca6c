pub mod app_config;
pub mod clock;
pub mod config;
pub mod offers;
pub mod search;
pub mod sources;
pub mod usage;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_app_config, load_app_config_from_env};
pub use offers::{DedupKey, RawCandidate, SourceQuery, SourceReliability, ValidatedOffer};
pub use search::{
    normalize_limit, SearchFilters, SearchRequest, SearchResponse, SortField, DEFAULT_LIMIT,
    MAX_LIMIT,
};
pub use sources::{load_sources, parse_sources, RefreshQuery, SourceConfig, SourcesFile};
pub use usage::{CacheStats, ProviderUsage, StoreStats, UsageReport, UsageStats};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sources file {path}: {source}")]
    SourcesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources file: {0}")]
    SourcesFileParse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}
