//! Read-only snapshots exposed through the usage/stats surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Budget state of one source for the current UTC day.
///
/// `requests_today + requests_remaining == daily_limit` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub requests_today: u32,
    pub requests_remaining: u32,
    pub daily_limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub provider: String,
    pub requests_today: u32,
    pub requests_remaining: u32,
    pub daily_limit: u32,
    pub last_request_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub provider_calls: u64,
    pub fallbacks: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub stored_offers: usize,
    pub last_handoff_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub providers: Vec<ProviderUsage>,
    pub cache: CacheStats,
    pub database: StoreStats,
}
