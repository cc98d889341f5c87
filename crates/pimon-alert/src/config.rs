use crate::comparator::NumericComparator;
use crate::error::{AlarmConfigError, ConfigError, ConfigIssue, IssueKind};
use crate::rules::threshold::{Condition, EvaluationMode, ThresholdRule};
use pimon_common::types::{Namespace, ProcessState};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;

// Schema as written by the user. Leaf values stay untyped so a wrong type
// becomes one more collected issue instead of a failed parse.

#[derive(Debug, Default, Deserialize)]
struct RawDocument {
    #[serde(default)]
    host: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    process: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAlarm {
    name: Option<Value>,
    thresholds: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawThreshold {
    description: Option<Value>,
    trend: Option<Value>,
    threshold: Option<Value>,
    state: Option<Value>,
    consecutive: Option<Value>,
    interval: Option<Value>,
}

/// A leaf field after type checking.
enum Field<T> {
    Absent,
    /// Present with the wrong type; already reported.
    Invalid,
    Present(T),
}

impl<T> Field<T> {
    fn is_set(&self) -> bool {
        !matches!(self, Field::Absent)
    }
}

fn typed<T>(
    value: Option<Value>,
    field: &str,
    expected: &str,
    at: &str,
    issues: &mut Vec<ConfigIssue>,
    extract: impl FnOnce(&Value) -> Option<T>,
) -> Field<T> {
    let Some(value) = value else {
        return Field::Absent;
    };
    match extract(&value) {
        Some(v) => Field::Present(v),
        None => {
            issues.push(ConfigIssue::new(
                IssueKind::Unrecognized,
                format!("type of {field} in {at} (expected {expected})"),
            ));
            Field::Invalid
        }
    }
}

fn text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlarmDefinition {
    /// Display name used in alarm messages.
    pub name: String,
    pub thresholds: Vec<ThresholdRule>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlarmConfig {
    pub host: BTreeMap<String, AlarmDefinition>,
    pub process: BTreeMap<String, AlarmDefinition>,
}

impl AlarmConfig {
    /// Reads and validates the alarm document at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AlarmConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| AlarmConfigError::ResourceMissing {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_yaml_str(&content)?)
    }

    /// Parses and validates a YAML alarm document, collecting every defect.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Err(ConfigError::new(vec![ConfigIssue::new(
                IssueKind::Missing,
                "configuration not loaded/present",
            )]));
        }

        let raw: RawDocument = serde_yaml::from_str(content).map_err(|e| {
            ConfigError::new(vec![ConfigIssue::new(
                IssueKind::Unrecognized,
                format!("invalid configuration document: {e}"),
            )])
        })?;

        let mut issues = Vec::new();
        let config = Self {
            host: validate_section(Namespace::Host, raw.host.unwrap_or_default(), &mut issues),
            process: validate_section(
                Namespace::Process,
                raw.process.unwrap_or_default(),
                &mut issues,
            ),
        };

        if issues.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::new(issues))
        }
    }

    pub fn namespace(&self, namespace: Namespace) -> &BTreeMap<String, AlarmDefinition> {
        match namespace {
            Namespace::Host => &self.host,
            Namespace::Process => &self.process,
        }
    }

    pub fn alarm(&self, namespace: Namespace, key: &str) -> Option<&AlarmDefinition> {
        self.namespace(namespace).get(key)
    }

    /// Keys configured in `namespace`, i.e. what the collectors should sample.
    pub fn keys(&self, namespace: Namespace) -> Vec<String> {
        self.namespace(namespace).keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.host.is_empty() && self.process.is_empty()
    }
}

fn validate_section(
    namespace: Namespace,
    section: BTreeMap<String, Value>,
    issues: &mut Vec<ConfigIssue>,
) -> BTreeMap<String, AlarmDefinition> {
    let mut validated = BTreeMap::new();

    for (key, value) in section {
        let label = format!("{namespace}.{key}");

        let raw: RawAlarm = match serde_yaml::from_value(value) {
            Ok(raw) => raw,
            Err(_) => {
                issues.push(ConfigIssue::new(
                    IssueKind::Unrecognized,
                    format!("definition of alarm {label} (expected a mapping)"),
                ));
                continue;
            }
        };

        let at = format!("alarm {label}");
        let name = match typed(raw.name, "name", "a string", &at, issues, text) {
            Field::Present(name) => Some(name),
            Field::Absent => {
                issues.push(ConfigIssue::new(
                    IssueKind::Missing,
                    format!("name for alarm {label}"),
                ));
                None
            }
            Field::Invalid => None,
        };

        let Some(raw_thresholds) = raw.thresholds else {
            issues.push(ConfigIssue::new(
                IssueKind::Missing,
                format!("thresholds for alarm {label}"),
            ));
            continue;
        };
        let Value::Sequence(raw_thresholds) = raw_thresholds else {
            issues.push(ConfigIssue::new(
                IssueKind::Unrecognized,
                format!("type of thresholds in {at} (expected a list)"),
            ));
            continue;
        };

        let thresholds: Vec<ThresholdRule> = raw_thresholds
            .into_iter()
            .enumerate()
            .filter_map(|(i, t)| validate_threshold(namespace, &label, i + 1, t, issues))
            .collect();

        if let Some(name) = name {
            validated.insert(key, AlarmDefinition { name, thresholds });
        }
    }

    validated
}

fn validate_threshold(
    namespace: Namespace,
    label: &str,
    position: usize,
    value: Value,
    issues: &mut Vec<ConfigIssue>,
) -> Option<ThresholdRule> {
    let at = format!("threshold #{position} for alarm {label}");

    let raw: RawThreshold = match serde_yaml::from_value(value) {
        Ok(raw) => raw,
        Err(_) => {
            issues.push(ConfigIssue::new(
                IssueKind::Unrecognized,
                format!("{at} (expected a mapping)"),
            ));
            return None;
        }
    };
    let before = issues.len();

    let description = typed(raw.description, "description", "a string", &at, issues, text);
    if !description.is_set() {
        issues.push(ConfigIssue::new(
            IssueKind::Missing,
            format!("description in {at}"),
        ));
    }

    let threshold = typed(raw.threshold, "threshold", "a number", &at, issues, Value::as_f64);
    let state = typed(raw.state, "state", "a string", &at, issues, text);

    let condition = match (threshold.is_set(), state.is_set()) {
        (false, false) => {
            issues.push(ConfigIssue::new(
                IssueKind::Unrecognized,
                format!("threshold type in {at} (expected `threshold` or `state`)"),
            ));
            None
        }
        (true, true) => {
            issues.push(ConfigIssue::new(
                IssueKind::Unresolvable,
                format!("cannot specify threshold, state on one threshold ({at})"),
            ));
            None
        }
        (true, false) => {
            let trend = typed(raw.trend, "trend", "a string", &at, issues, text);
            numeric_condition(namespace, threshold, trend, &at, issues)
        }
        (false, true) => state_condition(namespace, state, &at, issues),
    };

    let consecutive = typed(
        raw.consecutive,
        "consecutive",
        "a non-negative integer",
        &at,
        issues,
        |v| v.as_u64().and_then(|n| u32::try_from(n).ok()),
    );
    let interval = typed(
        raw.interval,
        "interval",
        "a non-negative number of seconds",
        &at,
        issues,
        Value::as_u64,
    );

    let mode = match (consecutive, interval) {
        (Field::Invalid, _) | (_, Field::Invalid) => None,
        (Field::Absent | Field::Present(0), _) => Some(EvaluationMode::Immediate),
        (Field::Present(count), Field::Present(interval_secs)) => {
            Some(EvaluationMode::Consecutive {
                count,
                interval_secs,
            })
        }
        (Field::Present(_), Field::Absent) => {
            issues.push(ConfigIssue::new(
                IssueKind::Missing,
                format!("interval in {at} (required when consecutive is set)"),
            ));
            None
        }
    };

    if issues.len() > before {
        return None;
    }

    let Field::Present(description) = description else {
        return None;
    };
    Some(ThresholdRule {
        description,
        condition: condition?,
        mode: mode?,
    })
}

fn numeric_condition(
    namespace: Namespace,
    threshold: Field<f64>,
    trend: Field<String>,
    at: &str,
    issues: &mut Vec<ConfigIssue>,
) -> Option<Condition> {
    if namespace == Namespace::Process {
        issues.push(ConfigIssue::new(
            IssueKind::Unresolvable,
            format!("numeric threshold on a process alarm ({at})"),
        ));
    }

    let trend = match trend {
        Field::Present(trend) => trend,
        Field::Absent => {
            issues.push(ConfigIssue::new(IssueKind::Missing, format!("trend in {at}")));
            return None;
        }
        Field::Invalid => return None,
    };

    let comparator = match trend.parse::<NumericComparator>() {
        Ok(comparator) => comparator,
        Err(_) => {
            issues.push(ConfigIssue::new(
                IssueKind::Unrecognized,
                format!("trend {trend} in {at}"),
            ));
            return None;
        }
    };

    match threshold {
        Field::Present(threshold) => Some(Condition::Numeric {
            comparator,
            threshold,
        }),
        _ => None,
    }
}

fn state_condition(
    namespace: Namespace,
    state: Field<String>,
    at: &str,
    issues: &mut Vec<ConfigIssue>,
) -> Option<Condition> {
    if namespace == Namespace::Host {
        issues.push(ConfigIssue::new(
            IssueKind::Unresolvable,
            format!("process state on a host alarm ({at})"),
        ));
    }

    let Field::Present(state) = state else {
        return None;
    };
    match state.parse::<ProcessState>() {
        Ok(state) => Some(Condition::State(state)),
        Err(_) => {
            issues.push(ConfigIssue::new(
                IssueKind::Unrecognized,
                format!("process state {state} in {at}"),
            ));
            None
        }
    }
}
