use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The two independent key spaces tracked by the monitor.
///
/// A key such as `"cpu"` may exist in both without conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Host,
    Process,
}

impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::Host, Namespace::Process];
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Namespace::Host => write!(f, "host"),
            Namespace::Process => write!(f, "process"),
        }
    }
}

/// Liveness of a watched process.
///
/// # Examples
///
/// ```
/// use pimon_common::types::ProcessState;
///
/// let state: ProcessState = "down".parse().unwrap();
/// assert_eq!(state, ProcessState::Down);
/// assert_eq!(state.to_string(), "down");
/// assert!("sleeping".parse::<ProcessState>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    Up,
    Down,
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessState::Up => write!(f, "up"),
            ProcessState::Down => write!(f, "down"),
        }
    }
}

impl std::str::FromStr for ProcessState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(ProcessState::Up),
            "down" => Ok(ProcessState::Down),
            _ => Err(format!("unknown process state: {s}")),
        }
    }
}

/// A single observed value: a host metric reading or a process state.
///
/// Serialized untagged, so host samples persist as plain numbers and
/// process samples as `"up"` / `"down"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Number(f64),
    State(ProcessState),
}

impl SampleValue {
    /// Numeric view used for averaging. Process states count as 1.0 (up) / 0.0 (down).
    pub fn as_f64(&self) -> f64 {
        match self {
            SampleValue::Number(v) => *v,
            SampleValue::State(ProcessState::Up) => 1.0,
            SampleValue::State(ProcessState::Down) => 0.0,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            SampleValue::Number(v) => Some(*v),
            SampleValue::State(_) => None,
        }
    }

    pub fn as_state(&self) -> Option<ProcessState> {
        match self {
            SampleValue::State(s) => Some(*s),
            SampleValue::Number(_) => None,
        }
    }
}

impl From<f64> for SampleValue {
    fn from(v: f64) -> Self {
        SampleValue::Number(v)
    }
}

impl From<ProcessState> for SampleValue {
    fn from(s: ProcessState) -> Self {
        SampleValue::State(s)
    }
}

impl std::fmt::Display for SampleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleValue::Number(v) => write!(f, "{v}"),
            SampleValue::State(s) => write!(f, "{s}"),
        }
    }
}

/// One recorded observation. `ts` is whole seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub value: SampleValue,
    pub ts: i64,
}

impl MetricSample {
    pub fn new(value: impl Into<SampleValue>, ts: i64) -> Self {
        Self {
            value: value.into(),
            ts,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.ts, 0)
    }
}

/// Key → value readings handed over by a collector for one namespace.
pub type Snapshot = BTreeMap<String, SampleValue>;
