use crate::Collector;
use anyhow::Result;
use pimon_common::types::{Namespace, ProcessState, SampleValue, Snapshot};
use sysinfo::System;

/// Reports `up` for every requested name that appears in some running
/// process's command line, `down` otherwise.
pub struct ProcessCollector {
    system: System,
}

impl ProcessCollector {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    fn command_lines(&mut self) -> Vec<String> {
        self.system.refresh_all();
        self.system
            .processes()
            .values()
            .map(|p| {
                let cmd: Vec<String> = p
                    .cmd()
                    .iter()
                    .map(|arg| arg.to_string_lossy().into_owned())
                    .collect();
                if cmd.is_empty() {
                    p.name().to_string_lossy().into_owned()
                } else {
                    cmd.join(" ")
                }
            })
            .collect()
    }
}

impl Default for ProcessCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for ProcessCollector {
    fn name(&self) -> &str {
        "process"
    }

    fn namespace(&self) -> Namespace {
        Namespace::Process
    }

    fn collect(&mut self, keys: &[String]) -> Result<Snapshot> {
        if keys.is_empty() {
            return Ok(Snapshot::new());
        }

        let running = self.command_lines();
        tracing::debug!(processes = running.len(), "Inspected process list");

        Ok(keys
            .iter()
            .map(|key| (key.clone(), SampleValue::State(process_state(&running, key))))
            .collect())
    }
}

/// Substring match of `name` against each command line.
pub fn process_state(command_lines: &[String], name: &str) -> ProcessState {
    if command_lines.iter().any(|cmd| cmd.contains(name)) {
        ProcessState::Up
    } else {
        ProcessState::Down
    }
}
