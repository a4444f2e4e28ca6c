use thiserror::Error;

/// Why a translation provider could not translate a batch.
///
/// The chain treats every variant the same way: fall through to the next
/// provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} timed out after {timeout_secs}s")]
    Timeout { provider: String, timeout_secs: u64 },

    #[error("{provider} quota exhausted (HTTP {status})")]
    Quota { provider: String, status: u16 },

    #[error("{provider} returned HTTP {status}")]
    Status { provider: String, status: u16 },

    #[error("HTTP error from {provider}: {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed response from {provider}: {reason}")]
    MalformedResponse { provider: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("translation cache unavailable: {0}")]
    Unavailable(String),
}
