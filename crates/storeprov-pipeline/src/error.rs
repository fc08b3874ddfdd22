use thiserror::Error;

use storeprov_shopify::ScraperError;

/// Why one store contributed fewer orders than it should have.
///
/// These never fail a run; they end up in
/// [`PipelineReport::failures`](crate::PipelineReport::failures).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch for store {store_name} was abandoned at the run deadline")]
    Cancelled { store_name: String },

    #[error("fetch for store {store_name} failed: {source}")]
    Fetch {
        store_name: String,
        #[source]
        source: ScraperError,
    },
}
