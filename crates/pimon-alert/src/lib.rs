//! Threshold evaluation for the rolling telemetry history.
//!
//! The alarm document ([`config::AlarmConfig`]) declares, per metric key, an
//! ordered list of [`rules::threshold::ThresholdRule`]s. The
//! [`engine::AlarmEngine`] walks every key present in the telemetry store
//! that also has rules configured, evaluates each rule against the key's
//! sample history and collects [`engine::AlarmRecord`]s, which
//! [`summary::render`] folds into one notification message.

pub mod comparator;
pub mod config;
pub mod engine;
pub mod error;
pub mod rules;
pub mod summary;

#[cfg(test)]
mod tests;

pub use config::{AlarmConfig, AlarmDefinition};
pub use engine::{AlarmEngine, AlarmRecord, AlarmValue};
pub use error::{AlarmConfigError, ConfigError, ConfigIssue, IssueKind};
