//! Orchestration of one provision run.
//!
//! 1. Resolve the reporting window from the range token.
//! 2. Fetch every store's orders through an [`OrderSource`], at most
//!    `max_concurrent_stores` at a time.
//! 3. Record per-store failures; they never abort the run.
//! 4. Decorate each store's orders and fold them into one [`Aggregator`] in
//!    registry order.
//! 5. Return the flattened rows with the failure list.

use std::future::Future;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use storeprov_core::{DateWindow, StoreConfig};
use storeprov_shopify::{PartialFetch, RawOrder, ShopifyOrdersClient};

use crate::aggregate::{decorate, Aggregator, ResultRow};
use crate::error::PipelineError;
use crate::window::{resolve_window, RangeToken};

/// Anything that can list a store's orders inside a window.
pub trait OrderSource: Sync {
    /// Orders of `store` created in `window`, newest-first.
    ///
    /// On failure the orders gathered so far travel with the error.
    fn fetch_store_orders(
        &self,
        store: &StoreConfig,
        window: &DateWindow,
    ) -> impl Future<Output = Result<Vec<RawOrder>, PartialFetch>> + Send;
}

impl OrderSource for ShopifyOrdersClient {
    fn fetch_store_orders(
        &self,
        store: &StoreConfig,
        window: &DateWindow,
    ) -> impl Future<Output = Result<Vec<RawOrder>, PartialFetch>> + Send {
        async move {
            self.fetch_orders_in_window(store, window)
                .await
                .map(|fetch| fetch.orders)
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Canonical timezone for windows and day buckets.
    pub timezone: Tz,
    /// Reference instant for window resolution. `None` means `Utc::now()`.
    pub now: Option<DateTime<Utc>>,
    pub max_concurrent_stores: usize,
    /// Whether orders fetched before a store's failure still count.
    pub keep_partial_orders: bool,
    /// Fetches still running at this instant are abandoned.
    pub deadline: Option<tokio::time::Instant>,
}

impl PipelineOptions {
    #[must_use]
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            now: None,
            max_concurrent_stores: 4,
            keep_partial_orders: true,
            deadline: None,
        }
    }
}

/// A store whose fetch did not complete cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreFailure {
    pub store_name: String,
    pub error: String,
    /// Orders from this store that still made it into the rows.
    pub orders_kept: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub window: DateWindow,
    pub rows: Vec<ResultRow>,
    pub failures: Vec<StoreFailure>,
}

impl PipelineReport {
    /// True when stores were requested and none of them fetched cleanly.
    #[must_use]
    pub fn all_failed(&self, store_count: usize) -> bool {
        store_count > 0 && self.failures.len() >= store_count
    }
}

struct FailedFetch {
    error: PipelineError,
    collected: Vec<RawOrder>,
}

async fn fetch_one<S: OrderSource>(
    source: &S,
    store: &StoreConfig,
    window: &DateWindow,
    deadline: Option<tokio::time::Instant>,
) -> Result<Vec<RawOrder>, FailedFetch> {
    let fetch = source.fetch_store_orders(store, window);

    let result = match deadline {
        Some(deadline) => {
            let Ok(result) = tokio::time::timeout_at(deadline, fetch).await else {
                return Err(FailedFetch {
                    error: PipelineError::Cancelled {
                        store_name: store.store_name.clone(),
                    },
                    collected: Vec::new(),
                });
            };
            result
        }
        None => fetch.await,
    };

    result.map_err(|partial| FailedFetch {
        error: PipelineError::Fetch {
            store_name: store.store_name.clone(),
            source: partial.source,
        },
        collected: partial.collected,
    })
}

/// Runs one provision report over `stores`.
///
/// Never fails as a whole: a store that cannot be fetched shows up in
/// [`PipelineReport::failures`] and the remaining stores are still reported.
pub async fn run_pipeline<S: OrderSource>(
    source: &S,
    stores: &[StoreConfig],
    range: RangeToken,
    options: &PipelineOptions,
) -> PipelineReport {
    let now = options.now.unwrap_or_else(Utc::now);
    let window = resolve_window(range, now, options.timezone);

    tracing::info!(
        %range,
        start = %window.start,
        end = %window.end,
        stores = stores.len(),
        "starting provision run"
    );

    // `buffered` yields in input order, so folding stays in registry order.
    let outcomes: Vec<Result<Vec<RawOrder>, FailedFetch>> = stream::iter(stores)
        .map(|store| fetch_one(source, store, &window, options.deadline))
        .buffered(options.max_concurrent_stores.max(1))
        .collect()
        .await;

    let mut aggregator = Aggregator::new(options.timezone);
    let mut failures = Vec::new();

    for (store, outcome) in stores.iter().zip(outcomes) {
        let orders = match outcome {
            Ok(orders) => orders,
            Err(FailedFetch { error, collected }) => {
                let kept = if options.keep_partial_orders {
                    collected
                } else {
                    Vec::new()
                };
                tracing::error!(
                    store = %store.store_name,
                    error = %error,
                    orders_kept = kept.len(),
                    "store fetch failed, continuing with remaining stores"
                );
                failures.push(StoreFailure {
                    store_name: store.store_name.clone(),
                    error: error.to_string(),
                    orders_kept: kept.len(),
                });
                kept
            }
        };

        for order in &decorate(store, orders) {
            aggregator.fold(order);
        }
    }

    let rows = aggregator.finish();

    if !failures.is_empty() {
        tracing::warn!(
            failed = failures.len(),
            total = stores.len(),
            "provision run finished with store failures"
        );
    }
    tracing::info!(rows = rows.len(), "provision run complete");

    PipelineReport {
        window,
        rows,
        failures,
    }
}
