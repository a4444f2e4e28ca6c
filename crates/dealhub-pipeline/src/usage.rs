//! Per-source daily request budgets.
//!
//! Counters live for the life of the process and reset when the injected
//! clock crosses a UTC day boundary. Every outbound attempt is recorded,
//! whether it succeeds or not.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use dealhub_core::{Clock, ProviderUsage, SystemClock, UsageStats};

use crate::error::BudgetExhausted;

#[derive(Debug, Clone)]
struct UsageRecord {
    day: NaiveDate,
    requests_today: u32,
    daily_limit: u32,
    last_request_at: Option<DateTime<Utc>>,
}

impl UsageRecord {
    fn roll_over(&mut self, today: NaiveDate) {
        if self.day != today {
            self.day = today;
            self.requests_today = 0;
        }
    }

    fn stats(&self) -> UsageStats {
        // Only `record_query` increments, and it never passes the limit.
        let requests_today = self.requests_today.min(self.daily_limit);
        UsageStats {
            requests_today,
            requests_remaining: self.daily_limit - requests_today,
            daily_limit: self.daily_limit,
        }
    }
}

pub struct UsageTracker {
    clock: Arc<dyn Clock>,
    records: Mutex<HashMap<String, UsageRecord>>,
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for UsageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageTracker")
            .field("records", &*self.lock())
            .finish_non_exhaustive()
    }
}

impl UsageTracker {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Register `source_id` with a daily budget.
    ///
    /// Re-registering keeps today's count and only updates the limit.
    pub fn register(&self, source_id: &str, daily_limit: u32) {
        let today = self.clock.today();
        let mut records = self.lock();
        records
            .entry(source_id.to_string())
            .and_modify(|record| {
                record.roll_over(today);
                record.daily_limit = daily_limit;
            })
            .or_insert(UsageRecord {
                day: today,
                requests_today: 0,
                daily_limit,
                last_request_at: None,
            });
    }

    /// Whether `source_id` still has budget today. Unknown sources never do.
    #[must_use]
    pub fn may_query(&self, source_id: &str) -> bool {
        let today = self.clock.today();
        let mut records = self.lock();
        records.get_mut(source_id).is_some_and(|record| {
            record.roll_over(today);
            record.requests_today < record.daily_limit
        })
    }

    /// Consume one unit of `source_id`'s budget for an outbound attempt.
    ///
    /// The check and the increment happen under one lock, so concurrent
    /// callers can never push a source past its limit.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetExhausted`] when the budget is already used up or the
    /// source was never registered.
    pub fn record_query(&self, source_id: &str) -> Result<UsageStats, BudgetExhausted> {
        let now = self.clock.now();
        let mut records = self.lock();
        let Some(record) = records.get_mut(source_id) else {
            return Err(BudgetExhausted {
                source_id: source_id.to_string(),
                daily_limit: 0,
            });
        };

        record.roll_over(now.date_naive());
        if record.requests_today >= record.daily_limit {
            return Err(BudgetExhausted {
                source_id: source_id.to_string(),
                daily_limit: record.daily_limit,
            });
        }

        record.requests_today += 1;
        record.last_request_at = Some(now);
        Ok(record.stats())
    }

    #[must_use]
    pub fn stats_for(&self, source_id: &str) -> Option<UsageStats> {
        let today = self.clock.today();
        let mut records = self.lock();
        records.get_mut(source_id).map(|record| {
            record.roll_over(today);
            record.stats()
        })
    }

    /// Stats for every registered source, sorted by source id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ProviderUsage> {
        let today = self.clock.today();
        let mut records = self.lock();
        let mut providers: Vec<ProviderUsage> = records
            .iter_mut()
            .map(|(id, record)| {
                record.roll_over(today);
                let stats = record.stats();
                ProviderUsage {
                    provider: id.clone(),
                    requests_today: stats.requests_today,
                    requests_remaining: stats.requests_remaining,
                    daily_limit: stats.daily_limit,
                    last_request_at: record.last_request_at,
                }
            })
            .collect();
        providers.sort_by(|a, b| a.provider.cmp(&b.provider));
        providers
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, UsageRecord>> {
        // Counters stay consistent even if a holder panicked mid-read.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
