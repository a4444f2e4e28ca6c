//! JSON-over-HTTP source adapter.
//!
//! Both the product-data API and the headless-browser scraper sidecars expose
//! the same search endpoint:
//!
//! ```text
//! GET {base_url}/search?q=..&brand=..&category=..&page=..&page_size=..
//! -> { "products": [ { "name": .., "original_price": .., "sale_price": .., .. } ] }
//! ```
//!
//! They differ only in how far their data can be trusted, which is carried as
//! the adapter's [`SourceReliability`].

use std::time::Duration;

use async_trait::async_trait;
use dealhub_core::{RawCandidate, SourceConfig, SourceQuery, SourceReliability};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::error::SourceError;
use crate::source::SourceAdapter;

/// Body markers of an anti-automation interstitial served with a 200.
const BLOCK_MARKERS: &[&str] = &["captcha", "are you a robot", "access denied"];

/// Products are decoded one at a time so a single broken record only costs
/// itself.
#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    #[serde(default)]
    products: Vec<serde_json::Value>,
}

pub struct HttpSourceAdapter {
    id: String,
    reliability: SourceReliability,
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for HttpSourceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSourceAdapter")
            .field("id", &self.id)
            .field("reliability", &self.reliability)
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish_non_exhaustive()
    }
}

impl HttpSourceAdapter {
    /// Creates an adapter for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`SourceError::MalformedResponse`] if `base_url` does not parse.
    pub fn new(
        id: &str,
        base_url: &str,
        reliability: SourceReliability,
        api_key: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SourceError> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .map_err(|e| SourceError::Http {
                source_id: id.to_owned(),
                source: e,
            })?;

        // A trailing slash makes `join` append rather than replace the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SourceError::MalformedResponse {
            source_id: id.to_owned(),
            reason: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            id: id.to_owned(),
            reliability,
            client,
            base_url,
            api_key,
            timeout,
        })
    }

    /// Builds an adapter from a sources-file entry, resolving its API key
    /// from the environment.
    ///
    /// # Errors
    ///
    /// See [`HttpSourceAdapter::new`].
    pub fn from_config(
        config: &SourceConfig,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SourceError> {
        Self::new(
            &config.id,
            &config.base_url,
            config.reliability,
            config.api_key(),
            timeout_secs,
            user_agent,
        )
    }

    fn search_url(&self, query: &SourceQuery) -> Result<Url, SourceError> {
        let mut url = self
            .base_url
            .join("search")
            .map_err(|e| SourceError::MalformedResponse {
                source_id: self.id.clone(),
                reason: format!("cannot build search URL: {e}"),
            })?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &query.query);
            if let Some(brand) = &query.brand {
                pairs.append_pair("brand", brand);
            }
            if let Some(category) = &query.category {
                pairs.append_pair("category", category);
            }
            pairs.append_pair("page", &query.page.to_string());
            pairs.append_pair("page_size", &query.page_size.to_string());
        }

        Ok(url)
    }

    fn map_transport_error(&self, error: reqwest::Error) -> SourceError {
        if error.is_timeout() {
            SourceError::timeout(&self.id, self.timeout)
        } else {
            SourceError::Http {
                source_id: self.id.clone(),
                source: error,
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for HttpSourceAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn reliability(&self) -> SourceReliability {
        self.reliability
    }

    async fn query(&self, query: &SourceQuery) -> Result<Vec<RawCandidate>, SourceError> {
        let url = self.search_url(query)?;

        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let status = response.status();

        match status {
            StatusCode::NOT_FOUND => {
                return Err(SourceError::NoResultsFound {
                    source_id: self.id.clone(),
                })
            }
            StatusCode::FORBIDDEN | StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS => {
                return Err(SourceError::BlockedByTarget {
                    source_id: self.id.clone(),
                    reason: format!("HTTP {}", status.as_u16()),
                })
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(SourceError::BlockedByTarget {
                    source_id: self.id.clone(),
                    reason: "rate limited by target (HTTP 429)".to_string(),
                })
            }
            s if !s.is_success() => {
                return Err(SourceError::UnexpectedStatus {
                    source_id: self.id.clone(),
                    status: s.as_u16(),
                })
            }
            _ => {}
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let parsed = match serde_json::from_str::<SearchResponseBody>(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                let lowered = body.to_lowercase();
                if BLOCK_MARKERS.iter().any(|marker| lowered.contains(marker)) {
                    return Err(SourceError::BlockedByTarget {
                        source_id: self.id.clone(),
                        reason: "anti-automation page served instead of results".to_string(),
                    });
                }
                return Err(SourceError::MalformedResponse {
                    source_id: self.id.clone(),
                    reason: e.to_string(),
                });
            }
        };

        let total = parsed.products.len();
        let candidates: Vec<RawCandidate> = parsed
            .products
            .into_iter()
            .enumerate()
            .filter_map(|(index, product)| {
                match serde_json::from_value::<RawCandidate>(product) {
                    Ok(mut candidate) => {
                        candidate.source.clone_from(&self.id);
                        Some(candidate)
                    }
                    Err(e) => {
                        tracing::debug!(
                            source = %self.id,
                            index,
                            error = %e,
                            "skipping undecodable product"
                        );
                        None
                    }
                }
            })
            .collect();

        if candidates.len() < total {
            tracing::debug!(
                source = %self.id,
                decoded = candidates.len(),
                total,
                "some products could not be decoded"
            );
        }

        Ok(candidates)
    }
}
