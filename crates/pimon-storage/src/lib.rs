//! Rolling telemetry history persisted as a single JSON document.
//!
//! Every metric key keeps a bounded FIFO of [`MetricSample`]s together with
//! the moving average over what is retained. The whole document is written
//! back to disk after each recorded sample and read again, so callers always
//! observe durable state.
//!
//! Runs are expected to be scheduled one at a time. There is no locking
//! around the read-modify-write cycle: two overlapping runs against the same
//! file race and the last writer wins.
//!
//! [`MetricSample`]: pimon_common::types::MetricSample

pub mod error;
pub mod series;
pub mod store;


pub use error::StorageError;
pub use series::MetricSeries;
pub use store::{TelemetryData, TelemetryStore, DEFAULT_MAX_RETAINED};
