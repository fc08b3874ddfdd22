//! Retry with exponential backoff for transient Admin API failures.
//!
//! Shopify throttles the Admin REST API with a leaky bucket and answers 429
//! when it overflows. Those, 5xx responses and network failures are retried;
//! everything else is returned immediately. With `max_retries = 0` a page is
//! requested exactly once.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` if `err` is worth another attempt after a delay.
///
/// Credential failures, 404s, other 4xx statuses and malformed bodies are
/// final: retrying returns the same answer.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Http(_) => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        ScraperError::Unauthorized { .. }
        | ScraperError::NotFound { .. }
        | ScraperError::Deserialize { .. }
        | ScraperError::PaginationLimit { .. }
        | ScraperError::InvalidShopUrl { .. } => false,
    }
}

/// Delay in milliseconds before retry `attempt` (1-based).
fn backoff_delay_ms(err: &ScraperError, attempt: u32, backoff_base_ms: u64) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << (attempt.max(1) - 1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;

    let server_floor = match err {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => retry_after_secs.saturating_mul(1000),
        _ => 0,
    };
    jittered.max(server_floor).min(MAX_DELAY_MS)
}

/// Runs `operation`, retrying transient errors up to `max_retries` times.
///
/// The wait before retry `n` (1-based) is `backoff_base_ms * 2^(n-1)` with
/// ±25 % jitter, capped at 60 s. A 429's `Retry-After` is a lower bound.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = backoff_delay_ms(&err, attempt, backoff_base_ms);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient Shopify error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
