use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::offers::SourceReliability;
use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Identifier reported in search provenance and usage stats.
    pub id: String,
    pub base_url: String,
    pub reliability: SourceReliability,
    pub daily_limit: u32,
    /// Overrides the reliability tier's starting confidence score.
    #[serde(default)]
    pub base_score: Option<u8>,
    /// Name of the env var holding the source's bearer key, if it needs one.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl SourceConfig {
    /// Resolve the API key from the environment, if one is configured.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

/// A query the background refresh job replays on every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshQuery {
    pub query: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SourcesFile {
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub refresh_queries: Vec<RefreshQuery>,
}

/// Load and validate the sources configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_sources(&content)
}

/// Parse and validate sources YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_sources(content: &str) -> Result<SourcesFile, ConfigError> {
    let sources_file: SourcesFile = serde_yaml::from_str(content)?;
    validate_sources(&sources_file)?;
    Ok(sources_file)
}

fn validate_sources(sources_file: &SourcesFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for source in &sources_file.sources {
        let id = source.id.trim();
        if id.is_empty() {
            return Err(ConfigError::Validation(
                "source id must be non-empty".to_string(),
            ));
        }

        if !seen_ids.insert(id.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source id: '{id}'"
            )));
        }

        if source.daily_limit == 0 {
            return Err(ConfigError::Validation(format!(
                "source '{id}' has daily_limit 0; a source that may never be queried should be removed"
            )));
        }

        if source.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "source '{id}' has an empty base_url"
            )));
        }

        if let Some(score) = source.base_score {
            if !(70..=99).contains(&score) {
                return Err(ConfigError::Validation(format!(
                    "source '{id}' has base_score {score}; must be within 70..=99"
                )));
            }
        }
    }

    for refresh in &sources_file.refresh_queries {
        if refresh.query.trim().is_empty() {
            return Err(ConfigError::Validation(
                "refresh query must be non-empty".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "sources_test.rs"]
mod tests;
