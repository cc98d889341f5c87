#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use pimon_agent::config::AgentConfig;
use pimon_collector::Collector;
use pimon_common::types::{Namespace, SampleValue, Snapshot};
use pimon_notify::{NotificationChannel, NotifyError};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Collector that reports canned values for the keys it knows.
pub struct FixedCollector {
    namespace: Namespace,
    values: Snapshot,
    pub requested: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FixedCollector {
    pub fn new(namespace: Namespace, values: &[(&str, SampleValue)]) -> Self {
        Self {
            namespace,
            values: values
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Collector for FixedCollector {
    fn name(&self) -> &str {
        "fixed"
    }

    fn namespace(&self) -> Namespace {
        self.namespace
    }

    fn collect(&mut self, keys: &[String]) -> Result<Snapshot> {
        self.requested.lock().unwrap().push(keys.to_vec());
        Ok(keys
            .iter()
            .filter_map(|k| self.values.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }
}

/// Collector whose system query always fails.
pub struct BrokenCollector;

impl Collector for BrokenCollector {
    fn name(&self) -> &str {
        "broken"
    }

    fn namespace(&self) -> Namespace {
        Namespace::Host
    }

    fn collect(&mut self, _keys: &[String]) -> Result<Snapshot> {
        anyhow::bail!("sensor unavailable")
    }
}

/// Channel that keeps every message it was handed.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    pub sent: Arc<Mutex<Vec<String>>>,
    refuse: bool,
}

impl RecordingChannel {
    pub fn refusing() -> Self {
        Self {
            sent: Arc::default(),
            refuse: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, message: &str) -> pimon_notify::Result<()> {
        self.sent.lock().unwrap().push(message.to_string());
        if self.refuse {
            return Err(NotifyError::ApiError {
                service: "recording".into(),
                status: 502,
                body: "bad gateway".into(),
            });
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}

/// Agent config rooted in `dir` with the given alarm document written out.
pub fn agent_config(dir: &TempDir, alarms_yaml: &str) -> Result<AgentConfig> {
    let alarms_path = dir.path().join("alarms.yaml");
    std::fs::write(&alarms_path, alarms_yaml)?;
    Ok(config_at(dir.path(), alarms_path))
}

pub fn config_at(root: &Path, alarms_path: impl Into<std::path::PathBuf>) -> AgentConfig {
    AgentConfig {
        alarms_path: alarms_path.into(),
        telemetry_path: root.join("storage").join("telemetry.json"),
        log_dir: None,
        max_retained: 20,
        hostname: None,
    }
}

pub const ALARMS: &str = r#"
host:
  cpu:
    name: CPU usage
    thresholds:
      - description: CPU above 80% for three polls
        trend: gt
        threshold: 80
        consecutive: 3
        interval: 3600
  mem:
    name: Memory
    thresholds:
      - description: Memory nearly full
        trend: geq
        threshold: 90
process:
  nginx:
    name: Nginx
    thresholds:
      - description: nginx is down
        state: down
"#;
