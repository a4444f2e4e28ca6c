//! Cache-first translation facade.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dealhub_core::{AppConfig, CacheStats, Clock};

use crate::cache::{cache_key, MemoryTranslationCache, TranslationCache};
use crate::chain::ProviderChain;
use crate::error::ProviderError;
use crate::provider::{HttpTranslationProvider, TranslationProvider};

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    provider_calls: AtomicU64,
    fallbacks: AtomicU64,
}

/// Translates product text through the cache and the provider chain.
///
/// Never fails: when every real provider is down the input comes back
/// unchanged and nothing is cached.
pub struct Translator {
    chain: ProviderChain,
    cache: Arc<dyn TranslationCache>,
    counters: Counters,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("chain", &self.chain)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl Translator {
    #[must_use]
    pub fn new(chain: ProviderChain, cache: Arc<dyn TranslationCache>) -> Self {
        Self {
            chain,
            cache,
            counters: Counters::default(),
        }
    }

    /// Build the chain and cache from application config.
    ///
    /// Without `translation_api_url` the chain is pass-through only.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the HTTP provider cannot be built.
    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self, ProviderError> {
        let mut providers: Vec<Arc<dyn TranslationProvider>> = Vec::new();
        if let Some(url) = &config.translation_api_url {
            providers.push(Arc::new(HttpTranslationProvider::new(
                url,
                config.translation_api_key.as_deref(),
                config.translation_timeout_secs,
                &config.http_user_agent,
            )?));
        } else {
            tracing::info!("no translation API configured, translations pass through");
        }

        let cache = MemoryTranslationCache::new(
            clock,
            Duration::from_secs(config.translation_cache_ttl_secs),
        );
        Ok(Self::new(ProviderChain::new(providers), Arc::new(cache)))
    }

    pub async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> String {
        let texts = [text.to_string()];
        self.batch_translate(&texts, source_lang, target_lang)
            .await
            .pop()
            .unwrap_or_else(|| text.to_string())
    }

    /// Translate `texts`, returning one output per input in input order.
    ///
    /// Cached texts are served from the cache; the rest go to the chain in a
    /// single batch with duplicates collapsed.
    pub async fn batch_translate(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Vec<String> {
        let source_lang = normalize_lang(source_lang);
        let target_lang = normalize_lang(target_lang);
        if source_lang == target_lang {
            return texts.to_vec();
        }

        let mut output: Vec<Option<String>> = vec![None; texts.len()];
        // Uncached texts, deduplicated, and where each one goes in `output`.
        let mut pending: Vec<String> = Vec::new();
        let mut slots: Vec<Vec<usize>> = Vec::new();
        let mut pending_index: HashMap<&str, usize> = HashMap::new();

        for (idx, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                output[idx] = Some(text.clone());
                continue;
            }

            let key = cache_key(text, &source_lang, &target_lang);
            match self.cache.get(&key).await {
                Ok(Some(hit)) => {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    output[idx] = Some(hit);
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "translation cache read failed, treating as miss");
                }
            }

            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            let slot = *pending_index.entry(text.as_str()).or_insert_with(|| {
                pending.push(text.clone());
                slots.push(Vec::new());
                pending.len() - 1
            });
            slots[slot].push(idx);
        }

        if !pending.is_empty() {
            let outcome = self
                .chain
                .translate_batch(&pending, &source_lang, &target_lang)
                .await;

            // The pass-through fallback is not a provider call.
            let real_calls = outcome
                .attempts
                .saturating_sub(usize::from(!outcome.cacheable));
            self.counters.provider_calls.fetch_add(
                u64::try_from(real_calls).unwrap_or(u64::MAX),
                Ordering::Relaxed,
            );
            if outcome.failures > 0 {
                self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
            }

            for ((text, translated), positions) in
                pending.iter().zip(outcome.translations).zip(slots)
            {
                if outcome.cacheable {
                    let key = cache_key(text, &source_lang, &target_lang);
                    if let Err(e) = self.cache.set(&key, translated.clone()).await {
                        tracing::warn!(error = %e, "translation cache write failed");
                    }
                }
                for idx in positions {
                    output[idx] = Some(translated.clone());
                }
            }

            tracing::debug!(
                provider = %outcome.provider,
                count = pending.len(),
                source_lang = %source_lang,
                target_lang = %target_lang,
                "translated batch"
            );
        }

        output
            .into_iter()
            .zip(texts)
            .map(|(translated, original)| translated.unwrap_or_else(|| original.clone()))
            .collect()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.entry_count().await,
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            provider_calls: self.counters.provider_calls.load(Ordering::Relaxed),
            fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
        }
    }
}

fn normalize_lang(lang: &str) -> String {
    lang.trim().to_lowercase()
}
