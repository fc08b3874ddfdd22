use chrono::{DateTime, Utc};
use serde::Serialize;

/// Half-open `[start, end)` range of instants an ingestion run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Builds a window, swapping the bounds if they arrive reversed.
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// True for instants at or after the exclusive upper bound.
    #[must_use]
    pub fn is_past_end(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.end
    }
}
