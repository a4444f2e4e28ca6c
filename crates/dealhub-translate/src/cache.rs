//! Translation cache keyed on language pair and text digest.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dealhub_core::{Clock, SystemClock};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::error::CacheError;

/// Default time-to-live for cached translations: one day.
pub const DEFAULT_TTL: Duration = Duration::from_secs(86_400);

/// Cache key for `text` translated from `source_lang` to `target_lang`.
///
/// Languages are expected to be normalized already (trimmed, lowercase).
#[must_use]
pub fn cache_key(text: &str, source_lang: &str, target_lang: &str) -> String {
    format!(
        "trans:{source_lang}:{target_lang}:{:x}",
        Sha256::digest(text.as_bytes())
    )
}

#[async_trait]
pub trait TranslationCache: Send + Sync {
    /// Returns `Ok(None)` for absent and expired entries.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Live (unexpired) entry count.
    async fn entry_count(&self) -> usize;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    /// `None` when the TTL overflows the calendar.
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

#[derive(Debug)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    last_sweep: DateTime<Utc>,
}

impl CacheState {
    fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        self.last_sweep = now;
        before - self.entries.len()
    }
}

/// In-process cache with a fixed TTL measured on the injected clock.
///
/// Writes sweep out expired entries at most once per TTL, so the map holds
/// roughly two TTLs' worth of distinct texts at most.
pub struct MemoryTranslationCache {
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    state: RwLock<CacheState>,
}

impl Default for MemoryTranslationCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), DEFAULT_TTL)
    }
}

impl MemoryTranslationCache {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        let last_sweep = clock.now();
        Self {
            clock,
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                last_sweep,
            }),
        }
    }

    /// Drop expired entries, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.state.write().await.sweep(now)
    }
}

#[async_trait]
impl TranslationCache for MemoryTranslationCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = self.clock.now();
        let state = self.state.read().await;
        Ok(state
            .entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let now = self.clock.now();
        let expires_at = now.checked_add_signed(self.ttl);
        let mut state = self.state.write().await;

        let sweep_due = state
            .last_sweep
            .checked_add_signed(self.ttl)
            .is_some_and(|due| now >= due);
        if sweep_due {
            let removed = state.sweep(now);
            if removed > 0 {
                tracing::debug!(removed, "swept expired translations");
            }
        }

        state
            .entries
            .insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    async fn entry_count(&self) -> usize {
        let now = self.clock.now();
        self.state
            .read()
            .await
            .entries
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }
}
