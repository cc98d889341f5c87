//! Metric producers for the monitor.
//!
//! Each [`Collector`] samples one [`Namespace`]: [`host::HostCollector`]
//! reads host gauges (CPU, memory, load, ...) and
//! [`process::ProcessCollector`] reports whether named processes are running.
//! Both hand back a plain key → value [`Snapshot`].

pub mod host;
pub mod process;

use anyhow::Result;
use pimon_common::types::{Namespace, Snapshot};
use sysinfo::System;

/// A producer of metric snapshots for one namespace.
pub trait Collector: Send + Sync {
    /// Collector name used in logs (e.g. `"host"`).
    fn name(&self) -> &str;

    /// The namespace the produced keys belong to.
    fn namespace(&self) -> Namespace;

    /// Samples the requested `keys`.
    ///
    /// Keys the collector does not support are skipped without error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying system query fails.
    fn collect(&mut self, keys: &[String]) -> Result<Snapshot>;
}

/// Host name used to label alarm messages.
pub fn host_name() -> String {
    System::host_name().unwrap_or_else(|| "unknown-host".to_string())
}
