//! HTTP client for the Shopify Admin REST `orders.json` endpoint.

mod fetch_window;
mod origin;

use std::time::Duration;

use chrono::SecondsFormat;
use reqwest::Client;
use storeprov_core::{DateWindow, StoreConfig};

use crate::error::ScraperError;
use crate::pagination::PageCursor;
use crate::rate_limit::retry_with_backoff;
use crate::types::OrdersResponse;

pub use fetch_window::{OrderFetch, StopReason};

/// Maximum number of pages walked for one store before giving up.
/// Guards against cycling cursors.
pub(super) const MAX_PAGES: usize = 500;

/// Shopify's hard cap on `limit` for the orders endpoint.
pub const MAX_PAGE_SIZE: u32 = 250;

const DEFAULT_API_VERSION: &str = "2024-04";

/// Which page of the orders listing to request.
#[derive(Debug, Clone, Copy)]
pub enum PageRequest<'a> {
    /// The first page, filtered to the window.
    First(&'a DateWindow),
    /// A follow-up page. Shopify rejects filter parameters next to
    /// `page_info`; the cursor already encodes them.
    Cursor(&'a str),
}

/// Client for the orders listing of many stores.
///
/// One instance is shared across stores; credentials come from each
/// [`StoreConfig`] per request (HTTP basic auth with key and password).
///
/// Transient errors (429, 5xx, network failures) are retried with
/// exponential backoff up to `max_retries` additional attempts.
pub struct ShopifyOrdersClient {
    pub(super) client: Client,
    pub(super) api_version: String,
    pub(super) page_size: u32,
    pub(super) inter_request_delay_ms: u64,
    /// Maximum number of retry attempts after the first failure.
    pub(super) max_retries: u32,
    /// Base delay for exponential backoff: `backoff_base_ms * 2^attempt`.
    pub(super) backoff_base_ms: u64,
}

impl ShopifyOrdersClient {
    /// Creates a client with the given timeout, `User-Agent`, and retry policy.
    ///
    /// Defaults: API version `2024-04`, 250 orders per page, no delay
    /// between pages.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            api_version: DEFAULT_API_VERSION.to_owned(),
            page_size: MAX_PAGE_SIZE,
            inter_request_delay_ms: 0,
            max_retries,
            backoff_base_ms,
        })
    }

    #[must_use]
    pub fn with_api_version(mut self, api_version: &str) -> Self {
        api_version.clone_into(&mut self.api_version);
        self
    }

    /// Sets the page size, clamped to `1..=250`.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Delay between consecutive page requests for the same store.
    #[must_use]
    pub fn with_inter_request_delay_ms(mut self, delay_ms: u64) -> Self {
        self.inter_request_delay_ms = delay_ms;
        self
    }

    /// Fetches one page of a store's orders, retrying transient errors.
    ///
    /// Returns the parsed page and the cursor advertised by its `Link` header.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ScraperError::Unauthorized`]: HTTP 401/403 (not retried).
    /// - [`ScraperError::NotFound`]: HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status (5xx retried).
    /// - [`ScraperError::Http`]: network or TLS failure after all retries.
    /// - [`ScraperError::Deserialize`]: malformed body (not retried).
    /// - [`ScraperError::InvalidShopUrl`]: the store origin is not a URL.
    pub async fn fetch_orders_page(
        &self,
        store: &StoreConfig,
        request: PageRequest<'_>,
    ) -> Result<(OrdersResponse, PageCursor), ScraperError> {
        let url = self.orders_url(&store.shop_origin(), request)?;

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .basic_auth(&store.api_key, Some(&store.password))
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    // Shopify sends fractional seconds, e.g. "2.0".
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<f64>().ok())
                        .filter(|secs| secs.is_finite() && *secs >= 0.0)
                        .map_or(60, |secs| secs.ceil() as u64);

                    return Err(ScraperError::RateLimited {
                        domain: origin::extract_domain(&url),
                        retry_after_secs,
                    });
                }

                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN
                {
                    return Err(ScraperError::Unauthorized { url });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ScraperError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                // Read the Link header before the body consumes the response.
                let cursor = PageCursor::from_link_header(
                    response
                        .headers()
                        .get(reqwest::header::LINK)
                        .and_then(|v| v.to_str().ok()),
                );

                let body = response.text().await?;
                let parsed = serde_json::from_str::<OrdersResponse>(&body).map_err(|e| {
                    ScraperError::Deserialize {
                        context: format!("orders page for {}", store.store_name),
                        source: e,
                    }
                })?;

                Ok((parsed, cursor))
            }
        })
        .await
    }

    /// Builds the `orders.json` URL for a store origin and page request.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidShopUrl`] if `origin` cannot be parsed
    /// as a URL base.
    fn orders_url(&self, origin: &str, request: PageRequest<'_>) -> Result<String, ScraperError> {
        let base = format!(
            "{}/admin/api/{}/orders.json",
            origin.trim_end_matches('/'),
            self.api_version
        );
        let mut url = reqwest::Url::parse(&base).map_err(|e| ScraperError::InvalidShopUrl {
            shop_url: origin.to_owned(),
            reason: format!("\"{base}\" is not a valid URL: {e}"),
        })?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &self.page_size.to_string());
            match request {
                PageRequest::First(window) => {
                    query
                        .append_pair("status", "any")
                        .append_pair(
                            "created_at_min",
                            &window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
                        )
                        .append_pair(
                            "created_at_max",
                            &window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
                        );
                }
                PageRequest::Cursor(cursor) => {
                    query.append_pair("page_info", cursor);
                }
            }
        }

        Ok(url.to_string())
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
