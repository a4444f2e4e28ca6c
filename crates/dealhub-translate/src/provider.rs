//! Translation providers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Maximum number of texts per `/v2/translate` call.
const BATCH_SIZE: usize = 50;

/// Quota-exceeded status used by DeepL-compatible APIs.
const QUOTA_EXCEEDED: u16 = 456;

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Whether results from this provider may be written to the cache.
    fn is_cacheable(&self) -> bool {
        true
    }

    /// Translate `texts` in one logical call, returning one output per input
    /// in the same order.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError>;
}

/// Last-resort provider that returns its input untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughProvider;

#[async_trait]
impl TranslationProvider for PassThroughProvider {
    fn name(&self) -> &str {
        "pass-through"
    }

    fn is_cacheable(&self) -> bool {
        false
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_lang: &str,
        _target_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        Ok(texts.to_vec())
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: &'a [String],
    source_lang: String,
    target_lang: String,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}

/// Client for a DeepL-style `POST /v2/translate` API.
pub struct HttpTranslationProvider {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl std::fmt::Debug for HttpTranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTranslationProvider")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl HttpTranslationProvider {
    /// # Errors
    ///
    /// Returns [`ProviderError::Network`] if the `reqwest::Client` cannot be
    /// built.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProviderError::Network {
                provider: "http".to_string(),
                source: e,
            })?;

        Ok(Self {
            client,
            url: format!("{}/v2/translate", base_url.trim_end_matches('/')),
            api_key: api_key.map(str::to_string),
            timeout_secs,
        })
    }

    async fn translate_chunk(
        &self,
        chunk: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let request = TranslateRequest {
            text: chunk,
            source_lang: source_lang.to_uppercase(),
            target_lang: target_lang.to_uppercase(),
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header(
                reqwest::header::AUTHORIZATION,
                format!("DeepL-Auth-Key {key}"),
            );
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == QUOTA_EXCEEDED {
            return Err(ProviderError::Quota {
                provider: self.name().to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: self.name().to_string(),
                status: status.as_u16(),
            });
        }

        let body: TranslateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                ProviderError::MalformedResponse {
                    provider: self.name().to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if body.translations.len() != chunk.len() {
            return Err(ProviderError::MalformedResponse {
                provider: self.name().to_string(),
                reason: format!(
                    "{} translations for {} inputs",
                    body.translations.len(),
                    chunk.len()
                ),
            });
        }

        Ok(body.translations.into_iter().map(|t| t.text).collect())
    }

    fn transport_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout {
                provider: self.name().to_string(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            ProviderError::Network {
                provider: self.name().to_string(),
                source: error,
            }
        }
    }
}

#[async_trait]
impl TranslationProvider for HttpTranslationProvider {
    fn name(&self) -> &str {
        "http"
    }

    /// Sends `texts` in chunks of 50. A failing chunk fails the whole batch,
    /// even when earlier chunks succeeded: the chain then falls back for all
    /// of it, so every text in one outcome shares one provider and one
    /// cacheability.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let mut translated = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            translated.extend(self.translate_chunk(chunk, source_lang, target_lang).await?);
        }
        Ok(translated)
    }
}
