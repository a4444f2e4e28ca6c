//! Ordered provider fallback.

use std::sync::Arc;

use crate::provider::{PassThroughProvider, TranslationProvider};

/// Result of running a batch through the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutcome {
    pub translations: Vec<String>,
    /// Name of the provider that produced `translations`.
    pub provider: String,
    pub cacheable: bool,
    /// Providers invoked, including the one that succeeded.
    pub attempts: usize,
    /// Providers that failed before one succeeded.
    pub failures: usize,
}

/// Providers tried in order until one succeeds.
///
/// The chain always ends with [`PassThroughProvider`], so evaluating it never
/// fails.
#[derive(Clone)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn TranslationProvider>>,
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.name()))
            .finish()
    }
}

impl Default for ProviderChain {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ProviderChain {
    /// Chain `providers` in order, followed by the pass-through fallback.
    #[must_use]
    pub fn new(mut providers: Vec<Arc<dyn TranslationProvider>>) -> Self {
        providers.push(Arc::new(PassThroughProvider));
        Self { providers }
    }

    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> ChainOutcome {
        let mut failures = 0;

        for provider in &self.providers {
            match provider
                .translate_batch(texts, source_lang, target_lang)
                .await
            {
                Ok(translations) if translations.len() == texts.len() => {
                    return ChainOutcome {
                        translations,
                        provider: provider.name().to_string(),
                        cacheable: provider.is_cacheable(),
                        attempts: failures + 1,
                        failures,
                    };
                }
                Ok(translations) => {
                    failures += 1;
                    tracing::warn!(
                        provider = provider.name(),
                        expected = texts.len(),
                        got = translations.len(),
                        "provider returned wrong number of translations, falling back"
                    );
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "translation provider failed, falling back"
                    );
                }
            }
        }

        // Only reachable if the pass-through itself misbehaves.
        ChainOutcome {
            translations: texts.to_vec(),
            provider: "identity".to_string(),
            cacheable: false,
            attempts: failures,
            failures,
        }
    }
}
