use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or the discount bounds
/// are inconsistent.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or the discount bounds
/// are inconsistent.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u8 = |var: &str, default: &str| -> Result<u8, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u8>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("DEALHUB_ENV", "development"));
    let bind_addr = parse_addr("DEALHUB_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("DEALHUB_LOG_LEVEL", "info");
    let sources_path = PathBuf::from(or_default("DEALHUB_SOURCES_PATH", "./config/sources.yaml"));

    let source_timeout_secs = parse_u64("DEALHUB_SOURCE_TIMEOUT_SECS", "20")?;
    let http_user_agent = or_default(
        "DEALHUB_HTTP_USER_AGENT",
        "dealhub/0.1 (discount-aggregator)",
    );

    let discount_floor_pct = parse_u8("DEALHUB_DISCOUNT_FLOOR_PCT", "10")?;
    let discount_ceiling_pct = parse_u8("DEALHUB_DISCOUNT_CEILING_PCT", "90")?;
    if discount_ceiling_pct > 100 {
        return Err(ConfigError::InvalidEnvVar {
            var: "DEALHUB_DISCOUNT_CEILING_PCT".to_string(),
            reason: format!("{discount_ceiling_pct} exceeds 100"),
        });
    }
    if discount_floor_pct > discount_ceiling_pct {
        return Err(ConfigError::Validation(format!(
            "discount floor {discount_floor_pct}% is above ceiling {discount_ceiling_pct}%"
        )));
    }

    let translation_api_url = optional("DEALHUB_TRANSLATION_API_URL");
    let translation_api_key = optional("DEALHUB_TRANSLATION_API_KEY");
    let translation_timeout_secs = parse_u64("DEALHUB_TRANSLATION_TIMEOUT_SECS", "10")?;
    let translation_cache_ttl_secs = parse_u64("DEALHUB_TRANSLATION_CACHE_TTL_SECS", "86400")?;
    let refresh_cron = optional("DEALHUB_REFRESH_CRON");

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        sources_path,
        source_timeout_secs,
        http_user_agent,
        discount_floor_pct,
        discount_ceiling_pct,
        translation_api_url,
        translation_api_key,
        translation_timeout_secs,
        translation_cache_ttl_secs,
        refresh_cron,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
