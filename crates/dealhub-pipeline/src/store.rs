//! Hand-off of final offer lists to the storage collaborator.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dealhub_core::{Clock, StoreStats, SystemClock, ValidatedOffer};
use tokio::sync::RwLock;

use crate::error::SinkError;
use crate::normalize::normalize_product_url;

/// Receives the final offer list of an aggregate call.
///
/// The hand-off is one-way: the aggregator never reads offers back.
#[async_trait]
pub trait OfferSink: Send + Sync {
    /// Upsert `offers`, returning how many were written.
    async fn upsert_offers(&self, offers: &[ValidatedOffer]) -> Result<usize, SinkError>;

    async fn stats(&self) -> StoreStats;
}

/// Identity used for idempotent upserts: the product URL when there is one,
/// otherwise `(brand, normalized name, source)`.
#[must_use]
pub fn upsert_key(offer: &ValidatedOffer) -> String {
    if let Some(url) = offer.product_url.as_deref().and_then(normalize_product_url) {
        return format!("url:{url}");
    }
    format!(
        "bns:{}\x00{}\x00{}",
        offer.brand.as_deref().unwrap_or("").trim().to_lowercase(),
        offer.normalized_name,
        offer.source,
    )
}

#[derive(Debug, Default)]
struct StoreState {
    offers: HashMap<String, ValidatedOffer>,
    last_handoff_at: Option<DateTime<Utc>>,
}

/// Process-local offer store keyed by [`upsert_key`].
pub struct MemoryOfferStore {
    clock: Arc<dyn Clock>,
    state: RwLock<StoreState>,
}

impl Default for MemoryOfferStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemoryOfferStore {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Look up a stored offer by its upsert key.
    pub async fn get(&self, key: &str) -> Option<ValidatedOffer> {
        self.state.read().await.offers.get(key).cloned()
    }
}

#[async_trait]
impl OfferSink for MemoryOfferStore {
    async fn upsert_offers(&self, offers: &[ValidatedOffer]) -> Result<usize, SinkError> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        for offer in offers {
            let key = upsert_key(offer);
            match state.offers.get_mut(&key) {
                // Keep the first-seen creation time across refreshes.
                Some(existing) => {
                    let created_at = existing.created_at;
                    *existing = offer.clone();
                    existing.created_at = created_at;
                }
                None => {
                    state.offers.insert(key, offer.clone());
                }
            }
        }
        state.last_handoff_at = Some(now);
        Ok(offers.len())
    }

    async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        StoreStats {
            stored_offers: state.offers.len(),
            last_handoff_at: state.last_handoff_at,
        }
    }
}
