use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.stores_path.to_str(), Some("./config/stores.yaml"));
    assert_eq!(cfg.timezone, chrono_tz::Europe::Berlin);
    assert_eq!(cfg.shopify_api_version, "2024-04");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "storeprov/0.1 (provision-reporting)");
    assert_eq!(cfg.max_concurrent_stores, 4);
    assert_eq!(cfg.page_size, 250);
    assert_eq!(cfg.inter_request_delay_ms, 500);
    assert_eq!(cfg.max_retries, 2);
    assert_eq!(cfg.retry_backoff_base_ms, 1000);
    assert!(cfg.run_deadline_secs.is_none());
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("STOREPROV_TIMEZONE", "America/New_York");
    map.insert("STOREPROV_MAX_CONCURRENT_STORES", "8");
    map.insert("STOREPROV_PAGE_SIZE", "100");
    map.insert("STOREPROV_MAX_RETRIES", "0");
    map.insert("STOREPROV_RUN_DEADLINE_SECS", "120");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.timezone, chrono_tz::America::New_York);
    assert_eq!(cfg.max_concurrent_stores, 8);
    assert_eq!(cfg.page_size, 100);
    assert_eq!(cfg.max_retries, 0);
    assert_eq!(cfg.run_deadline_secs, Some(120));
}

#[test]
fn build_app_config_rejects_unknown_timezone() {
    let mut map = HashMap::new();
    map.insert("STOREPROV_TIMEZONE", "Mars/Olympus_Mons");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STOREPROV_TIMEZONE"),
        "expected InvalidEnvVar(STOREPROV_TIMEZONE), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_page_size_above_shopify_cap() {
    let mut map = HashMap::new();
    map.insert("STOREPROV_PAGE_SIZE", "251");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STOREPROV_PAGE_SIZE"),
        "expected InvalidEnvVar(STOREPROV_PAGE_SIZE), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_page_size() {
    let mut map = HashMap::new();
    map.insert("STOREPROV_PAGE_SIZE", "0");
    assert!(build_app_config(lookup_from_map(&map)).is_err());
}

#[test]
fn build_app_config_rejects_non_numeric_retries() {
    let mut map = HashMap::new();
    map.insert("STOREPROV_MAX_RETRIES", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STOREPROV_MAX_RETRIES"),
        "expected InvalidEnvVar(STOREPROV_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn build_app_config_blank_deadline_means_none() {
    let mut map = HashMap::new();
    map.insert("STOREPROV_RUN_DEADLINE_SECS", "  ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.run_deadline_secs.is_none());
}

#[test]
fn build_app_config_rejects_invalid_deadline() {
    let mut map = HashMap::new();
    map.insert("STOREPROV_RUN_DEADLINE_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STOREPROV_RUN_DEADLINE_SECS"),
        "expected InvalidEnvVar(STOREPROV_RUN_DEADLINE_SECS), got: {result:?}"
    );
}
