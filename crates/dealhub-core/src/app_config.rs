use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub sources_path: PathBuf,
    pub source_timeout_secs: u64,
    pub http_user_agent: String,
    /// Smallest discount percentage surfaced; anything below is not a real deal.
    pub discount_floor_pct: u8,
    /// Largest discount percentage surfaced; anything above is treated as a
    /// mis-scraped price.
    pub discount_ceiling_pct: u8,
    pub translation_api_url: Option<String>,
    pub translation_api_key: Option<String>,
    pub translation_timeout_secs: u64,
    pub translation_cache_ttl_secs: u64,
    /// Six-field cron expression for the background refresh job.
    pub refresh_cron: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("sources_path", &self.sources_path)
            .field("source_timeout_secs", &self.source_timeout_secs)
            .field("http_user_agent", &self.http_user_agent)
            .field("discount_floor_pct", &self.discount_floor_pct)
            .field("discount_ceiling_pct", &self.discount_ceiling_pct)
            .field("translation_api_url", &self.translation_api_url)
            .field(
                "translation_api_key",
                &self.translation_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("translation_timeout_secs", &self.translation_timeout_secs)
            .field(
                "translation_cache_ttl_secs",
                &self.translation_cache_ttl_secs,
            )
            .field("refresh_cron", &self.refresh_cron)
            .finish()
    }
}
