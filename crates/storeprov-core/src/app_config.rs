use std::path::PathBuf;

use chrono_tz::Tz;

/// Process-wide settings, read once at startup from `STOREPROV_*` env vars.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub stores_path: PathBuf,
    /// Canonical timezone for window resolution and day bucketing.
    pub timezone: Tz,
    pub shopify_api_version: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_concurrent_stores: usize,
    /// Orders per page, always within `1..=250`.
    pub page_size: u32,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Upper bound for a whole pipeline run; `None` means no deadline.
    pub run_deadline_secs: Option<u64>,
}
