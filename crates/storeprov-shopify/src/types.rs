//! Response types for the Admin REST `orders.json` endpoint.
//!
//! Only the fields the provision pipeline reads are modelled; serde ignores
//! the rest of Shopify's (very large) order object.
//!
//! ### `order_number`
//! Shopify sends an integer (`1001`), while `name` carries the display form
//! (`"#1001"`). Some proxies re-encode it as a string, so both are accepted
//! and kept as a `String`.
//!
//! ### `created_at`
//! ISO 8601 with the shop's UTC offset, e.g. `"2024-05-06T10:15:00+02:00"`.
//! A value that does not parse fails the whole page.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;

/// Top-level response from `GET /admin/api/{version}/orders.json`.
#[derive(Debug, Deserialize)]
pub struct OrdersResponse {
    pub orders: Vec<RawOrder>,
}

/// One order, newest-first within a page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawOrder {
    pub created_at: DateTime<FixedOffset>,

    #[serde(deserialize_with = "storeprov_core::deserialize_order_number")]
    pub order_number: String,

    /// May be empty, e.g. for orders whose items were all removed.
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl RawOrder {
    #[must_use]
    pub fn created_at_utc(&self) -> DateTime<Utc> {
        self.created_at.with_timezone(&Utc)
    }

    /// Sum of all line-item quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.line_items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LineItem {
    pub title: String,
    pub quantity: u32,
}
