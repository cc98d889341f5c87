use crate::error::{Result, StorageError};
use crate::series::MetricSeries;
use chrono::Utc;
use pimon_common::types::{MetricSample, Namespace, SampleValue, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default number of samples retained per metric key.
pub const DEFAULT_MAX_RETAINED: usize = 20;

const EMPTY_DOCUMENT: &str = "{}";

/// On-disk shape of the telemetry document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryData {
    #[serde(default)]
    pub host: BTreeMap<String, MetricSeries>,
    #[serde(default)]
    pub process: BTreeMap<String, MetricSeries>,
}

impl TelemetryData {
    pub fn namespace(&self, namespace: Namespace) -> &BTreeMap<String, MetricSeries> {
        match namespace {
            Namespace::Host => &self.host,
            Namespace::Process => &self.process,
        }
    }

    fn namespace_mut(&mut self, namespace: Namespace) -> &mut BTreeMap<String, MetricSeries> {
        match namespace {
            Namespace::Host => &mut self.host,
            Namespace::Process => &mut self.process,
        }
    }
}

/// File-backed telemetry store.
pub struct TelemetryStore {
    path: PathBuf,
    max_retained: usize,
    data: TelemetryData,
}

impl TelemetryStore {
    /// Opens the store at `path`, creating an empty document (and its parent
    /// directory) when nothing exists there yet.
    pub fn open(path: impl Into<PathBuf>, max_retained: usize) -> Result<Self> {
        let mut store = Self {
            path: path.into(),
            max_retained: max_retained.max(1),
            data: TelemetryData::default(),
        };
        store.ensure_exists()?;
        store.load()?;
        Ok(store)
    }

    /// Replaces the in-memory state with what is on disk.
    pub fn load(&mut self) -> Result<()> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| StorageError::ResourceMissing {
                path: self.path.clone(),
                source,
            })?;

        self.data = if content.trim().is_empty() {
            TelemetryData::default()
        } else {
            serde_json::from_str(&content).map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            })?
        };
        Ok(())
    }

    /// Records `value` under `key` with the current time.
    pub fn record(
        &mut self,
        namespace: Namespace,
        key: &str,
        value: impl Into<SampleValue>,
    ) -> Result<()> {
        self.record_at(namespace, key, value, Utc::now().timestamp())
    }

    /// Records `value` under `key` stamped with `ts`, then persists the
    /// whole store and reloads it.
    ///
    /// Non-finite numbers are rejected before anything is touched.
    pub fn record_at(
        &mut self,
        namespace: Namespace,
        key: &str,
        value: impl Into<SampleValue>,
        ts: i64,
    ) -> Result<()> {
        let value = value.into();
        if let SampleValue::Number(v) = value {
            if !v.is_finite() {
                return Err(StorageError::NonFiniteSample {
                    namespace,
                    key: key.to_string(),
                    value: v,
                });
            }
        }

        let max_retained = self.max_retained;
        let series = self
            .data
            .namespace_mut(namespace)
            .entry(key.to_string())
            .or_default();
        series.push(MetricSample::new(value, ts), max_retained);

        tracing::debug!(
            %namespace,
            metric = key,
            retained = series.len(),
            moving_average = series.moving_average,
            "Recorded sample"
        );

        self.flush()?;
        self.load()
    }

    /// Records every entry of a collector snapshot. Returns how many were
    /// written; non-finite readings are skipped.
    pub fn record_snapshot(&mut self, namespace: Namespace, snapshot: &Snapshot) -> Result<usize> {
        let now = Utc::now().timestamp();
        let mut written = 0;
        for (key, value) in snapshot {
            match self.record_at(namespace, key, *value, now) {
                Ok(()) => written += 1,
                Err(StorageError::NonFiniteSample { value, .. }) => {
                    tracing::warn!(%namespace, metric = %key, value, "Skipping non-finite sample");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(written)
    }

    pub fn series(&self, namespace: Namespace, key: &str) -> Option<&MetricSeries> {
        self.data.namespace(namespace).get(key)
    }

    pub fn namespace(&self, namespace: Namespace) -> &BTreeMap<String, MetricSeries> {
        self.data.namespace(namespace)
    }

    pub fn data(&self) -> &TelemetryData {
        &self.data
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_retained(&self) -> usize {
        self.max_retained
    }

    /// Full overwrite of the document on disk.
    fn flush(&self) -> Result<()> {
        let encoded = serde_json::to_string(&self.data)?;
        std::fs::write(&self.path, encoded).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }

        let missing = |source: std::io::Error| StorageError::ResourceMissing {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(missing)?;
        }
        std::fs::write(&self.path, EMPTY_DOCUMENT).map_err(missing)?;
        tracing::info!(path = %self.path.display(), "Created empty telemetry store");
        Ok(())
    }
}
