//! Window-bounded multi-page order fetch for `ShopifyOrdersClient`.

use std::time::Duration;

use storeprov_core::{DateWindow, StoreConfig};

use crate::error::{PartialFetch, ScraperError};
use crate::pagination::PageCursor;
use crate::types::RawOrder;

use super::{PageRequest, ShopifyOrdersClient, MAX_PAGES};

/// Why pagination for a store ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page came back empty.
    Exhausted,
    /// The store's `first_order` sentinel appeared in a page.
    SentinelReached,
    /// The oldest order of the last page predates the window start.
    BeforeWindow,
    /// The last page advertised no `rel="next"` link.
    NoNextPage,
}

/// Orders collected for one store, newest-first, plus how the walk ended.
#[derive(Debug)]
pub struct OrderFetch {
    pub orders: Vec<RawOrder>,
    pub pages: usize,
    pub stop: StopReason,
}

/// Outcome of folding one page into the collected orders.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum PageStep {
    Continue(String),
    Stop(StopReason),
}

/// Applies the stop conditions to one newest-first page, appending the
/// orders that belong to the result.
///
/// Checked in order: empty page, sentinel present (keep the orders up to and
/// including it), oldest order before the window start, next cursor.
///
/// Shopify's `created_at_max` is inclusive, so orders stamped at or after
/// `window.end` are dropped here.
pub(super) fn absorb_page(
    store: &StoreConfig,
    window: &DateWindow,
    page: Vec<RawOrder>,
    cursor: PageCursor,
    collected: &mut Vec<RawOrder>,
) -> PageStep {
    if page.is_empty() {
        return PageStep::Stop(StopReason::Exhausted);
    }

    let before_end = |o: &RawOrder| !window.is_past_end(o.created_at_utc());

    if let Some(pos) = page.iter().position(|o| store.is_sentinel(&o.order_number)) {
        collected.extend(page.into_iter().take(pos + 1).filter(before_end));
        return PageStep::Stop(StopReason::SentinelReached);
    }

    let oldest_before_window = page
        .last()
        .is_some_and(|oldest| oldest.created_at_utc() < window.start);
    collected.extend(page.into_iter().filter(before_end));

    if oldest_before_window {
        return PageStep::Stop(StopReason::BeforeWindow);
    }

    match cursor {
        PageCursor::Next(token) => PageStep::Continue(token),
        PageCursor::NoMore => PageStep::Stop(StopReason::NoNextPage),
    }
}

impl ShopifyOrdersClient {
    /// Fetches every order of `store` created inside `window`, newest-first.
    ///
    /// Pages already fetched are kept whole even if they reach past the
    /// window start; the walk only stops requesting further pages.
    ///
    /// # Errors
    ///
    /// Returns [`PartialFetch`] on the first failing page (after retries) or
    /// when more than [`MAX_PAGES`] pages would be needed. The orders from
    /// earlier pages travel with the error.
    pub async fn fetch_orders_in_window(
        &self,
        store: &StoreConfig,
        window: &DateWindow,
    ) -> Result<OrderFetch, PartialFetch> {
        let mut orders: Vec<RawOrder> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            if pages >= MAX_PAGES {
                return Err(PartialFetch {
                    collected: orders,
                    source: ScraperError::PaginationLimit {
                        store: store.store_name.clone(),
                        max_pages: MAX_PAGES,
                    },
                });
            }

            if pages > 0 && self.inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.inter_request_delay_ms)).await;
            }

            let request = match cursor.as_deref() {
                None => PageRequest::First(window),
                Some(token) => PageRequest::Cursor(token),
            };

            let (response, next) = match self.fetch_orders_page(store, request).await {
                Ok(page) => page,
                Err(source) => {
                    tracing::warn!(
                        store = %store.store_name,
                        pages,
                        collected = orders.len(),
                        error = %source,
                        "order fetch failed"
                    );
                    return Err(PartialFetch {
                        collected: orders,
                        source,
                    });
                }
            };
            pages += 1;

            tracing::debug!(
                store = %store.store_name,
                page = pages,
                orders = response.orders.len(),
                "fetched orders page"
            );

            match absorb_page(store, window, response.orders, next, &mut orders) {
                PageStep::Continue(token) => cursor = Some(token),
                PageStep::Stop(stop) => {
                    tracing::info!(
                        store = %store.store_name,
                        pages,
                        orders = orders.len(),
                        ?stop,
                        "finished fetching orders"
                    );
                    return Ok(OrderFetch {
                        orders,
                        pages,
                        stop,
                    });
                }
            }
        }
    }
}
