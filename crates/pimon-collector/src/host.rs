use crate::Collector;
use anyhow::Result;
use pimon_common::types::{Namespace, SampleValue, Snapshot};
use std::path::Path;
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};

/// Keys understood by [`HostCollector`].
pub const SUPPORTED_KEYS: &[&str] = &["cpu", "mem", "swap", "load1", "load5", "load15", "disk"];

pub struct HostCollector {
    system: System,
    disks: Disks,
}

impl HostCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        Self {
            system,
            disks: Disks::new_with_refreshed_list(),
        }
    }

    pub fn supported(key: &str) -> bool {
        SUPPORTED_KEYS.contains(&key)
    }

    fn read(&mut self, key: &str) -> Option<f64> {
        match key {
            "cpu" => Some(self.system.global_cpu_usage() as f64),
            "mem" => {
                self.system.refresh_memory();
                Some(percent(self.system.used_memory(), self.system.total_memory()))
            }
            "swap" => {
                self.system.refresh_memory();
                Some(percent(self.system.used_swap(), self.system.total_swap()))
            }
            "load1" => Some(System::load_average().one),
            "load5" => Some(System::load_average().five),
            "load15" => Some(System::load_average().fifteen),
            "disk" => self.root_disk_usage(),
            _ => None,
        }
    }

    fn root_disk_usage(&mut self) -> Option<f64> {
        self.disks.refresh();
        let root = self
            .disks
            .iter()
            .find(|d| d.mount_point() == Path::new("/"))?;
        let total = root.total_space();
        let used = total.saturating_sub(root.available_space());
        Some(percent(used, total))
    }
}

impl Default for HostCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for HostCollector {
    fn name(&self) -> &str {
        "host"
    }

    fn namespace(&self) -> Namespace {
        Namespace::Host
    }

    fn collect(&mut self, keys: &[String]) -> Result<Snapshot> {
        // CPU usage is a delta between two refreshes.
        if keys.iter().any(|k| k == "cpu") {
            std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
            self.system.refresh_cpu_all();
        }

        let mut snapshot = Snapshot::new();
        for key in keys {
            match self.read(key) {
                Some(value) => {
                    snapshot.insert(key.clone(), SampleValue::Number(value));
                }
                None => tracing::debug!(metric = %key, "Unsupported host metric, skipping"),
            }
        }
        Ok(snapshot)
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total > 0 {
        (used as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}
