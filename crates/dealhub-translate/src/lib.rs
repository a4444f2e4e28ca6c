//! Product-text translation for DealHub.
//!
//! A [`Translator`] checks the [`TranslationCache`] first and sends whatever
//! is missing to a [`ProviderChain`] in one batch. The chain always ends with a
//! pass-through provider, so translation degrades to the original text rather
//! than failing. Pass-through results are never cached.

pub mod cache;
pub mod chain;
pub mod error;
pub mod provider;
pub mod translator;

pub use cache::{cache_key, MemoryTranslationCache, TranslationCache, DEFAULT_TTL};
pub use chain::{ChainOutcome, ProviderChain};
pub use error::{CacheError, ProviderError};
pub use provider::{HttpTranslationProvider, PassThroughProvider, TranslationProvider};
pub use translator::Translator;
