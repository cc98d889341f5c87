use crate::config::AlarmConfig;
use chrono::{DateTime, Utc};
use pimon_common::types::{Namespace, ProcessState, SampleValue};
use pimon_storage::TelemetryStore;

/// A threshold or observed value as it appears in an alarm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlarmValue {
    Number(f64),
    State(ProcessState),
    /// Number of samples, used by consecutive process-state rules.
    Count(u32),
}

impl From<SampleValue> for AlarmValue {
    fn from(value: SampleValue) -> Self {
        match value {
            SampleValue::Number(v) => AlarmValue::Number(v),
            SampleValue::State(s) => AlarmValue::State(s),
        }
    }
}

impl std::fmt::Display for AlarmValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlarmValue::Number(v) => write!(f, "{}", (v * 100.0).round() / 100.0),
            AlarmValue::State(s) => write!(f, "{s}"),
            AlarmValue::Count(n) => write!(f, "{n}"),
        }
    }
}

/// One breached rule, produced fresh on every evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmRecord {
    pub metric_display_name: String,
    pub threshold_description: String,
    pub threshold_value: AlarmValue,
    pub observed_value: AlarmValue,
    pub is_process_alarm: bool,
}

pub struct AlarmEngine {
    config: AlarmConfig,
}

impl AlarmEngine {
    pub fn new(config: AlarmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.config
    }

    /// Evaluates every configured rule against the telemetry history.
    ///
    /// Only keys present in both the store and the configuration are
    /// considered. Records come out host namespace first, then process, each
    /// in key order and then rule order.
    pub fn evaluate(&self, store: &TelemetryStore, now: DateTime<Utc>) -> Vec<AlarmRecord> {
        let mut alarms = Vec::new();

        for namespace in Namespace::ALL {
            for (key, series) in store.namespace(namespace) {
                let Some(alarm) = self.config.alarm(namespace, key) else {
                    tracing::debug!(%namespace, metric = %key, "No thresholds configured, skipping");
                    continue;
                };

                for rule in &alarm.thresholds {
                    let Some(breach) = rule.evaluate(series.samples(), now) else {
                        continue;
                    };

                    tracing::info!(
                        %namespace,
                        metric = %key,
                        rule = %rule.description,
                        threshold = %breach.threshold,
                        observed = %breach.observed,
                        "Threshold breached"
                    );

                    alarms.push(AlarmRecord {
                        metric_display_name: alarm.name.clone(),
                        threshold_description: rule.description.clone(),
                        threshold_value: breach.threshold,
                        observed_value: breach.observed,
                        is_process_alarm: namespace == Namespace::Process,
                    });
                }
            }
        }

        alarms
    }
}
