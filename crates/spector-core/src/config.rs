use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
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

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("SPECTOR_ENV", "development"))?;

    let bind_addr = parse_addr("SPECTOR_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("SPECTOR_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("SPECTOR_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SPECTOR_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "SPECTOR_DB_MIN_CONNECTIONS",
            format!(
                "must not exceed SPECTOR_DB_MAX_CONNECTIONS ({db_min_connections} > {db_max_connections})"
            ),
        ));
    }
    let db_acquire_timeout_secs = parse_u64("SPECTOR_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let shopify_api_version = or_default("SPECTOR_SHOPIFY_API_VERSION", "2025-01");
    if !is_api_version(&shopify_api_version) {
        return Err(invalid(
            "SPECTOR_SHOPIFY_API_VERSION",
            format!("expected YYYY-MM or 'unstable', got '{shopify_api_version}'"),
        ));
    }
    let shopify_admin_base_url = lookup("SPECTOR_SHOPIFY_ADMIN_BASE_URL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let shopify_request_timeout_secs = parse_u64("SPECTOR_SHOPIFY_REQUEST_TIMEOUT_SECS", "30")?;
    let shopify_max_retries = parse_u32("SPECTOR_SHOPIFY_MAX_RETRIES", "3")?;
    let shopify_retry_backoff_base_secs =
        parse_u64("SPECTOR_SHOPIFY_RETRY_BACKOFF_BASE_SECS", "1")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        shopify_api_version,
        shopify_admin_base_url,
        shopify_request_timeout_secs,
        shopify_max_retries,
        shopify_retry_backoff_base_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SPECTOR_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}

/// Shopify API versions are quarterly `YYYY-MM` tags, plus `unstable`.
fn is_api_version(s: &str) -> bool {
    if s == "unstable" {
        return true;
    }
    let bytes = s.as_bytes();
    bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
