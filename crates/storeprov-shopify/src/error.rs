use thiserror::Error;

use crate::types::RawOrder;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("credentials rejected by {url}")]
    Unauthorized { url: String },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("pagination limit reached for {store}: exceeded {max_pages} pages")]
    PaginationLimit { store: String, max_pages: usize },

    #[error("invalid shop URL \"{shop_url}\": {reason}")]
    InvalidShopUrl { shop_url: String, reason: String },
}

/// A store fetch that ended early. `collected` holds every order from the
/// pages that did arrive before `source` occurred, possibly none.
#[derive(Debug, Error)]
#[error("{source} ({} orders collected before the failure)", .collected.len())]
pub struct PartialFetch {
    pub collected: Vec<RawOrder>,
    #[source]
    pub source: ScraperError,
}
