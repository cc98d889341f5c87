use crate::comparator::NumericComparator;
use crate::engine::AlarmValue;
use chrono::{DateTime, Duration, Utc};
use pimon_common::types::{MetricSample, ProcessState, SampleValue};

/// What a sample is compared against.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Numeric {
        comparator: NumericComparator,
        threshold: f64,
    },
    /// Breaches when the observed process state equals this one.
    State(ProcessState),
}

impl Condition {
    pub fn matches(&self, value: &SampleValue) -> bool {
        match (self, value) {
            (Self::Numeric { comparator, threshold }, SampleValue::Number(v)) => {
                comparator.check(*v, *threshold)
            }
            (Self::State(expected), SampleValue::State(observed)) => expected == observed,
            _ => false,
        }
    }

    pub fn is_process(&self) -> bool {
        matches!(self, Self::State(_))
    }
}

/// How much history a rule looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    /// Only the latest sample counts.
    Immediate,
    /// The newest `count` samples no older than `interval_secs` must all match.
    Consecutive { count: u32, interval_secs: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRule {
    pub description: String,
    pub condition: Condition,
    pub mode: EvaluationMode,
}

/// Reported values of a breached rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Breach {
    pub threshold: AlarmValue,
    pub observed: AlarmValue,
}

impl ThresholdRule {
    /// Decides whether the rule is breached at `now` given `samples`
    /// (oldest first). Holds no state between calls.
    pub fn evaluate(&self, samples: &[MetricSample], now: DateTime<Utc>) -> Option<Breach> {
        let latest = samples.last()?;

        match self.mode {
            EvaluationMode::Immediate => {
                if !self.condition.matches(&latest.value) {
                    return None;
                }
                Some(self.report(latest, None))
            }
            EvaluationMode::Consecutive {
                count,
                interval_secs,
            } => {
                let cutoff = window_cutoff(now, interval_secs);
                let (present, breaches) = scan_window(samples, &self.condition, count, cutoff);

                // Too few fresh samples means the window is inconclusive.
                if present < count || breaches < count {
                    return None;
                }
                Some(self.report(latest, Some(breaches)))
            }
        }
    }

    fn report(&self, latest: &MetricSample, breaches: Option<u32>) -> Breach {
        match (&self.condition, self.mode) {
            (Condition::Numeric { threshold, .. }, _) => Breach {
                threshold: AlarmValue::Number(*threshold),
                observed: latest.value.into(),
            },
            (Condition::State(_), EvaluationMode::Consecutive { count, .. }) => Breach {
                threshold: AlarmValue::Count(count),
                observed: AlarmValue::Count(breaches.unwrap_or(0)),
            },
            (Condition::State(expected), EvaluationMode::Immediate) => Breach {
                threshold: AlarmValue::State(*expected),
                observed: latest.value.into(),
            },
        }
    }
}

/// Oldest timestamp still inside a window of `interval_secs` ending at `now`.
/// A window reaching past the representable range keeps every sample.
fn window_cutoff(now: DateTime<Utc>, interval_secs: u64) -> i64 {
    i64::try_from(interval_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|window| now.checked_sub_signed(window))
        .map_or(i64::MIN, |start| start.timestamp())
}

/// Walks from newest to oldest, stopping after `count` samples or at the first
/// sample older than `cutoff`. Returns `(present, breaches)`.
fn scan_window(
    samples: &[MetricSample],
    condition: &Condition,
    count: u32,
    cutoff: i64,
) -> (u32, u32) {
    let mut present = 0u32;
    let mut breaches = 0u32;

    for sample in samples.iter().rev() {
        if present == count || sample.ts < cutoff {
            break;
        }
        present += 1;
        if condition.matches(&sample.value) {
            breaches += 1;
        }
    }

    (present, breaches)
}
