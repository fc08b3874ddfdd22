pub mod client;
pub mod error;
pub mod pagination;
mod rate_limit;
pub mod types;

pub use client::{OrderFetch, PageRequest, ShopifyOrdersClient, StopReason};
pub use error::{PartialFetch, ScraperError};
pub use pagination::PageCursor;
pub use types::{LineItem, OrdersResponse, RawOrder};
