//! `translate` command.

use std::sync::Arc;

use dealhub_core::{AppConfig, SystemClock};
use dealhub_translate::Translator;

/// Translate `texts` and print one result per line, in input order.
///
/// # Errors
///
/// Returns an error if the translation provider cannot be built.
pub(crate) async fn run_translate(
    config: &AppConfig,
    from: &str,
    to: &str,
    texts: &[String],
) -> anyhow::Result<()> {
    let translator = Translator::from_config(config, Arc::new(SystemClock))?;
    let translations = translator.batch_translate(texts, from, to).await;

    for line in &translations {
        println!("{line}");
    }

    let stats = translator.stats().await;
    if stats.fallbacks > 0 {
        tracing::warn!(
            fallbacks = stats.fallbacks,
            "translation provider unavailable; some texts were passed through untranslated"
        );
    }
    Ok(())
}
