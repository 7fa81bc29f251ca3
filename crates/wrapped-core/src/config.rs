use crate::aggregate::MergePolicy;
use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can pass a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let optional_path = |var: &str| -> Option<PathBuf> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    };

    let env = parse_environment(&or_default("WRAPPED_ENV", "development"))?;
    let log_level = or_default("WRAPPED_LOG_LEVEL", "info");
    let selectors_path = optional_path("WRAPPED_SELECTORS_PATH");
    let store_path = optional_path("WRAPPED_STORE_PATH");
    let merge_policy = or_default("WRAPPED_MERGE_POLICY", "fill-gaps").parse::<MergePolicy>()?;

    let poll_interval_ms = parse_u64("WRAPPED_POLL_INTERVAL_MS", "800")?;
    let poll_max_attempts = parse_u32("WRAPPED_POLL_MAX_ATTEMPTS", "15")?;
    let poll_stable_rounds = parse_u32("WRAPPED_POLL_STABLE_ROUNDS", "2")?;
    if poll_max_attempts == 0 {
        return Err(invalid(
            "WRAPPED_POLL_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    if poll_stable_rounds == 0 {
        return Err(invalid(
            "WRAPPED_POLL_STABLE_ROUNDS",
            "must be at least 1".to_string(),
        ));
    }

    let load_check_interval_ms = parse_u64("WRAPPED_LOAD_CHECK_INTERVAL_MS", "300")?;
    let load_max_checks = parse_u32("WRAPPED_LOAD_MAX_CHECKS", "8")?;
    let settle_delay_ms = parse_u64("WRAPPED_SETTLE_DELAY_MS", "600")?;

    Ok(AppConfig {
        env,
        log_level,
        selectors_path,
        store_path,
        merge_policy,
        poll_interval_ms,
        poll_max_attempts,
        poll_stable_rounds,
        load_check_interval_ms,
        load_max_checks,
        settle_delay_ms,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "WRAPPED_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
