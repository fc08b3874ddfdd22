use crate::app_config::AppConfig;
use crate::ConfigError;

/// Shopify caps `limit` on the orders endpoint at 250.
const MAX_PAGE_SIZE: u32 = 250;

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
/// Decoupled from the process environment so tests can drive it from a
/// plain `HashMap`.
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let log_level = or_default("STOREPROV_LOG_LEVEL", "info");
    let stores_path = PathBuf::from(or_default("STOREPROV_STORES_PATH", "./config/stores.yaml"));

    let tz_name = or_default("STOREPROV_TIMEZONE", "Europe/Berlin");
    let timezone = tz_name
        .parse::<chrono_tz::Tz>()
        .map_err(|e| invalid("STOREPROV_TIMEZONE", e.to_string()))?;

    let shopify_api_version = or_default("STOREPROV_SHOPIFY_API_VERSION", "2024-04");
    let request_timeout_secs = parse_u64("STOREPROV_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("STOREPROV_USER_AGENT", "storeprov/0.1 (provision-reporting)");
    let max_concurrent_stores = parse_usize("STOREPROV_MAX_CONCURRENT_STORES", "4")?;

    let page_size = parse_u32("STOREPROV_PAGE_SIZE", "250")?;
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(invalid(
            "STOREPROV_PAGE_SIZE",
            format!("must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"),
        ));
    }

    let inter_request_delay_ms = parse_u64("STOREPROV_INTER_REQUEST_DELAY_MS", "500")?;
    let max_retries = parse_u32("STOREPROV_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("STOREPROV_RETRY_BACKOFF_BASE_MS", "1000")?;

    let run_deadline_secs = match lookup("STOREPROV_RUN_DEADLINE_SECS") {
        Ok(raw) if !raw.trim().is_empty() => Some(
            raw.trim()
                .parse::<u64>()
                .map_err(|e| invalid("STOREPROV_RUN_DEADLINE_SECS", e.to_string()))?,
        ),
        _ => None,
    };

    Ok(AppConfig {
        log_level,
        stores_path,
        timezone,
        shopify_api_version,
        request_timeout_secs,
        user_agent,
        max_concurrent_stores,
        page_size,
        inter_request_delay_ms,
        max_retries,
        retry_backoff_base_ms,
        run_deadline_secs,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
