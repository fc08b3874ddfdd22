//! Provision reporting pipeline: window resolution, per-store order fetch,
//! provision rules, and per-day/per-store aggregation.

pub mod aggregate;
pub mod error;
pub mod pipeline;
pub mod provision;
pub mod report;
pub mod window;

pub use aggregate::{
    aggregate, decorate, Aggregator, DayStoreBucket, DecoratedOrder, ResultRow, StoreContext,
};
pub use error::PipelineError;
pub use pipeline::{run_pipeline, OrderSource, PipelineOptions, PipelineReport, StoreFailure};
pub use provision::{provision, transaction_provision, ProvisionRule};
pub use report::{store_totals, StoreTotal, TimeSeries};
pub use window::{resolve_window, RangeToken};
