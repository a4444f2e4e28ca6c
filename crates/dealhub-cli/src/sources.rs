//! `sources` command: validate and list the sources file.

use dealhub_core::{AppConfig, SourcesFile};

/// # Errors
///
/// Returns an error if the sources file cannot be read or fails validation.
pub(crate) fn run_sources(config: &AppConfig) -> anyhow::Result<()> {
    let file = dealhub_core::load_sources(&config.sources_path)?;
    print!("{}", render_sources(&file));
    Ok(())
}

fn render_sources(file: &SourcesFile) -> String {
    let mut out = String::new();
    for source in &file.sources {
        let base_score = source
            .base_score
            .map_or_else(|| "default".to_string(), |s| s.to_string());
        let key = match (&source.api_key_env, source.api_key()) {
            (None, _) => "none",
            (Some(_), Some(_)) => "set",
            (Some(_), None) => "MISSING",
        };
        let reliability = source.reliability.to_string();
        out.push_str(&format!(
            "{:<20} {:<15} limit={:<6} base={:<8} key={:<8} {}\n",
            source.id, reliability, source.daily_limit, base_score, key, source.base_url
        ));
    }
    out.push_str(&format!(
        "{} sources, {} refresh queries\n",
        file.sources.len(),
        file.refresh_queries.len()
    ));
    out
}
