use crate::comparator::NumericComparator;
use crate::config::AlarmConfig;
use crate::engine::{AlarmEngine, AlarmRecord, AlarmValue};
use crate::error::{AlarmConfigError, IssueKind};
use crate::rules::threshold::{Condition, EvaluationMode, ThresholdRule};
use crate::summary::{escape_html, render};
use chrono::{DateTime, Duration, Utc};
use pimon_common::types::{MetricSample, Namespace, ProcessState, SampleValue};
use pimon_storage::{TelemetryStore, DEFAULT_MAX_RETAINED};
use tempfile::TempDir;

fn sample(value: impl Into<SampleValue>, now: DateTime<Utc>, secs_ago: i64) -> MetricSample {
    MetricSample::new(value, (now - Duration::seconds(secs_ago)).timestamp())
}

fn numeric_rule(comparator: NumericComparator, threshold: f64, mode: EvaluationMode) -> ThresholdRule {
    ThresholdRule {
        description: "CPU usage is high".into(),
        condition: Condition::Numeric {
            comparator,
            threshold,
        },
        mode,
    }
}

fn consecutive(count: u32, interval_secs: u64) -> EvaluationMode {
    EvaluationMode::Consecutive {
        count,
        interval_secs,
    }
}

fn history(now: DateTime<Utc>) -> Vec<MetricSample> {
    vec![
        sample(10.0, now, 120),
        sample(20.0, now, 60),
        sample(30.0, now, 0),
    ]
}

// ── Threshold evaluator ──

#[test]
fn consecutive_rule_fires_when_newest_samples_all_breach() {
    let now = Utc::now();
    let rule = numeric_rule(NumericComparator::Gt, 15.0, consecutive(2, 3600));

    let breach = rule.evaluate(&history(now), now).expect("should breach");
    assert_eq!(breach.observed, AlarmValue::Number(30.0));
    assert_eq!(breach.threshold, AlarmValue::Number(15.0));
}

#[test]
fn consecutive_rule_does_not_fire_when_one_sample_passes() {
    let now = Utc::now();
    let rule = numeric_rule(NumericComparator::Gt, 15.0, consecutive(3, 3600));
    assert!(rule.evaluate(&history(now), now).is_none());
}

#[test]
fn consecutive_rule_needs_enough_fresh_samples() {
    let now = Utc::now();
    // Only the newest sample lies inside the 90s window.
    let samples = vec![sample(99.0, now, 600), sample(99.0, now, 300), sample(99.0, now, 10)];
    let rule = numeric_rule(NumericComparator::Gt, 15.0, consecutive(2, 90));
    assert!(rule.evaluate(&samples, now).is_none());
}

#[test]
fn consecutive_rule_ignores_breaches_older_than_the_window() {
    let now = Utc::now();
    let samples = vec![
        sample(99.0, now, 900),
        sample(99.0, now, 800),
        sample(5.0, now, 30),
        sample(99.0, now, 0),
    ];
    let rule = numeric_rule(NumericComparator::Gt, 50.0, consecutive(2, 60));
    assert!(rule.evaluate(&samples, now).is_none());
}

#[test]
fn consecutive_rule_counts_sample_on_window_edge() {
    let now = Utc::now();
    let samples = vec![sample(80.0, now, 60), sample(80.0, now, 0)];
    let rule = numeric_rule(NumericComparator::Geq, 80.0, consecutive(2, 60));
    assert!(rule.evaluate(&samples, now).is_some());
}

#[test]
fn immediate_rule_uses_latest_sample_only() {
    let now = Utc::now();
    let rule = numeric_rule(NumericComparator::Geq, 90.0, EvaluationMode::Immediate);

    let samples = vec![sample(10.0, now, 60), sample(95.0, now, 0)];
    let breach = rule.evaluate(&samples, now).expect("should breach");
    assert_eq!(breach.observed, AlarmValue::Number(95.0));
    assert_eq!(breach.threshold, AlarmValue::Number(90.0));

    let samples = vec![sample(95.0, now, 60), sample(10.0, now, 0)];
    assert!(rule.evaluate(&samples, now).is_none());
}

#[test]
fn immediate_rule_ignores_staleness() {
    let now = Utc::now();
    let rule = numeric_rule(NumericComparator::Lt, 5.0, EvaluationMode::Immediate);
    let samples = vec![sample(1.0, now, 86_400)];
    assert!(rule.evaluate(&samples, now).is_some());
}

#[test]
fn empty_history_never_breaches() {
    let now = Utc::now();
    let immediate = numeric_rule(NumericComparator::Geq, 0.0, EvaluationMode::Immediate);
    let windowed = numeric_rule(NumericComparator::Geq, 0.0, consecutive(1, 60));
    assert!(immediate.evaluate(&[], now).is_none());
    assert!(windowed.evaluate(&[], now).is_none());
}

#[test]
fn process_down_rule_breaches_on_down_sample() {
    let now = Utc::now();
    let rule = ThresholdRule {
        description: "nginx stopped".into(),
        condition: Condition::State(ProcessState::Down),
        mode: EvaluationMode::Immediate,
    };

    let breach = rule
        .evaluate(&[sample(ProcessState::Down, now, 0)], now)
        .expect("should breach");
    assert_eq!(breach.observed, AlarmValue::State(ProcessState::Down));
    assert_eq!(breach.threshold, AlarmValue::State(ProcessState::Down));

    assert!(rule.evaluate(&[sample(ProcessState::Up, now, 0)], now).is_none());
}

#[test]
fn consecutive_process_rule_reports_counts() {
    let now = Utc::now();
    let rule = ThresholdRule {
        description: "nginx keeps dying".into(),
        condition: Condition::State(ProcessState::Down),
        mode: consecutive(3, 3600),
    };
    let samples = vec![
        sample(ProcessState::Up, now, 400),
        sample(ProcessState::Down, now, 300),
        sample(ProcessState::Down, now, 200),
        sample(ProcessState::Down, now, 100),
    ];

    let breach = rule.evaluate(&samples, now).expect("should breach");
    assert_eq!(breach.threshold, AlarmValue::Count(3));
    assert_eq!(breach.observed, AlarmValue::Count(3));
}

#[test]
fn numeric_rule_never_matches_process_samples() {
    let now = Utc::now();
    let rule = numeric_rule(NumericComparator::Lt, 1.0, EvaluationMode::Immediate);
    assert!(rule.evaluate(&[sample(ProcessState::Down, now, 0)], now).is_none());
}

#[test]
fn window_beyond_representable_time_keeps_every_sample() {
    let now = Utc::now();
    for interval_secs in [100_000_000_000_000, i64::MAX as u64, u64::MAX] {
        let rule = numeric_rule(NumericComparator::Gt, 15.0, consecutive(2, interval_secs));
        let breach = rule.evaluate(&history(now), now).expect("should breach");
        assert_eq!(breach.observed, AlarmValue::Number(30.0));

        let rule = numeric_rule(NumericComparator::Gt, 15.0, consecutive(3, interval_secs));
        assert!(rule.evaluate(&history(now), now).is_none());
    }
}

#[test]
fn zero_length_window_only_sees_samples_stamped_now() {
    let now = Utc::now();
    let samples = vec![sample(99.0, now, 1), sample(99.0, now, 0)];
    let rule = numeric_rule(NumericComparator::Gt, 50.0, consecutive(2, 0));
    assert!(rule.evaluate(&samples, now).is_none());

    let rule = numeric_rule(NumericComparator::Gt, 50.0, consecutive(1, 0));
    assert!(rule.evaluate(&samples, now).is_some());
}

// ── Alarm configuration ──

const VALID_DOC: &str = r#"
host:
  cpu:
    name: CPU usage
    thresholds:
      - description: CPU above 90% for three polls
        trend: gt
        threshold: 90
        consecutive: 3
        interval: 900
      - description: CPU pegged
        trend: geq
        threshold: 99.5
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

#[test]
fn valid_document_parses_into_typed_rules() {
    let config = AlarmConfig::from_yaml_str(VALID_DOC).unwrap();

    let cpu = config.alarm(Namespace::Host, "cpu").unwrap();
    assert_eq!(cpu.name, "CPU usage");
    assert_eq!(cpu.thresholds.len(), 2);
    assert_eq!(cpu.thresholds[0].mode, consecutive(3, 900));
    assert_eq!(
        cpu.thresholds[1].condition,
        Condition::Numeric {
            comparator: NumericComparator::Geq,
            threshold: 99.5
        }
    );

    let nginx = config.alarm(Namespace::Process, "nginx").unwrap();
    assert_eq!(
        nginx.thresholds[0].condition,
        Condition::State(ProcessState::Down)
    );
    assert_eq!(nginx.thresholds[0].mode, EvaluationMode::Immediate);

    assert_eq!(config.keys(Namespace::Host), vec!["cpu", "mem"]);
    assert_eq!(config.keys(Namespace::Process), vec!["nginx"]);
}

#[test]
fn missing_description_and_unknown_trend_are_two_issues() {
    let doc = r#"
host:
  cpu:
    name: CPU
    thresholds:
      - trend: bigger
        threshold: 90
"#;
    let err = AlarmConfig::from_yaml_str(doc).unwrap_err();
    assert_eq!(err.issues().len(), 2);
    assert_eq!(err.issues()[0].kind, IssueKind::Missing);
    assert!(err.issues()[0].message.contains("description"));
    assert_eq!(err.issues()[1].kind, IssueKind::Unrecognized);
    assert!(err.issues()[1].message.contains("trend bigger"));
}

#[test]
fn issues_are_collected_across_alarms() {
    let doc = r#"
host:
  cpu:
    thresholds:
      - description: both kinds
        trend: gt
        threshold: 1
        state: up
  mem:
    name: Memory
  swap:
    name: Swap
    thresholds:
      - description: no kind at all
      - description: windowed without interval
        trend: gt
        threshold: 1
        consecutive: 2
      - description: missing trend
        threshold: 5
process:
  sshd:
    name: SSH
    thresholds:
      - description: numeric on process
        trend: lt
        threshold: 1
      - description: unknown state
        state: sleeping
"#;
    let err = AlarmConfig::from_yaml_str(doc).unwrap_err();
    let kinds: Vec<IssueKind> = err.issues().iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        vec![
            IssueKind::Missing,      // host.cpu name
            IssueKind::Unresolvable, // host.cpu threshold + state
            IssueKind::Missing,      // host.mem thresholds
            IssueKind::Unrecognized, // host.swap #1 no kind
            IssueKind::Missing,      // host.swap #2 interval
            IssueKind::Missing,      // host.swap #3 trend
            IssueKind::Unresolvable, // process.sshd #1 numeric on process
            IssueKind::Unrecognized, // process.sshd #2 unknown state
        ]
    );
    assert_eq!(err.to_string().lines().count(), 8);
    assert!(err.to_string().lines().all(|l| l.starts_with("🔥 Illegal: ")));
}

#[test]
fn wrongly_typed_fields_are_collected_with_other_issues() {
    let doc = r#"
host:
  cpu:
    thresholds:
      - trend: 5
        threshold: 90
  mem:
    name: Memory
    thresholds:
      - description: Memory nearly full
        trend: gt
        threshold: ninety
"#;
    let err = AlarmConfig::from_yaml_str(doc).unwrap_err();
    let issues = err.issues();
    assert_eq!(issues.len(), 4, "{err}");

    assert_eq!(issues[0].kind, IssueKind::Missing);
    assert!(issues[0].message.contains("name for alarm host.cpu"));
    assert_eq!(issues[1].kind, IssueKind::Missing);
    assert!(issues[1].message.contains("description"));
    assert_eq!(issues[2].kind, IssueKind::Unrecognized);
    assert!(issues[2].message.contains("type of trend"));
    assert_eq!(issues[3].kind, IssueKind::Unrecognized);
    assert!(issues[3].message.contains("type of threshold"));
    assert!(issues[3].message.contains("host.mem"));
}

#[test]
fn non_mapping_entries_are_reported_per_entry() {
    let doc = r#"
host:
  cpu: just a string
  mem:
    name: Memory
    thresholds: not-a-list
  swap:
    name: 42
    thresholds:
      - oops
      - description: Swap in use
        trend: gt
        threshold: 10
        consecutive: -1
        interval: 60
"#;
    let err = AlarmConfig::from_yaml_str(doc).unwrap_err();
    let kinds: Vec<IssueKind> = err.issues().iter().map(|i| i.kind).collect();
    assert_eq!(kinds, vec![IssueKind::Unrecognized; 5], "{err}");
    assert!(err.issues()[0].message.contains("host.cpu"));
    assert!(err.issues()[1].message.contains("thresholds"));
    assert!(err.issues()[2].message.contains("type of name"));
    assert!(err.issues()[3].message.contains("threshold #1"));
    assert!(err.issues()[4].message.contains("type of consecutive"));
}

#[test]
fn very_large_interval_is_accepted_and_evaluates() {
    let doc = r#"
host:
  cpu:
    name: CPU
    thresholds:
      - description: always hot
        trend: gt
        threshold: 15
        consecutive: 2
        interval: 100000000000000
"#;
    let config = AlarmConfig::from_yaml_str(doc).unwrap();
    let rule = &config.alarm(Namespace::Host, "cpu").unwrap().thresholds[0];
    assert_eq!(rule.mode, consecutive(2, 100_000_000_000_000));

    let now = Utc::now();
    assert!(rule.evaluate(&history(now), now).is_some());
}

#[test]
fn state_rule_on_host_alarm_is_rejected() {
    let doc = r#"
host:
  cpu:
    name: CPU
    thresholds:
      - description: nonsense
        state: up
"#;
    let err = AlarmConfig::from_yaml_str(doc).unwrap_err();
    assert_eq!(err.issues().len(), 1);
    assert_eq!(err.issues()[0].kind, IssueKind::Unresolvable);
}

#[test]
fn empty_and_malformed_documents_are_rejected() {
    let err = AlarmConfig::from_yaml_str("   \n").unwrap_err();
    assert_eq!(err.issues()[0].kind, IssueKind::Missing);

    let err = AlarmConfig::from_yaml_str("host: [1, 2").unwrap_err();
    assert_eq!(err.issues().len(), 1);
    assert_eq!(err.issues()[0].kind, IssueKind::Unrecognized);
}

#[test]
fn load_reports_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = AlarmConfig::load(dir.path().join("alarms.yaml"));
    assert!(matches!(result, Err(AlarmConfigError::ResourceMissing { .. })));
}

// ── Alarm aggregation ──

fn store_with(dir: &TempDir) -> TelemetryStore {
    TelemetryStore::open(dir.path().join("telemetry.json"), DEFAULT_MAX_RETAINED).unwrap()
}

#[test]
fn engine_collects_breaches_in_metric_then_rule_order() {
    let dir = TempDir::new().unwrap();
    let mut store = store_with(&dir);
    let now = Utc::now();
    let ts = |secs_ago: i64| (now - Duration::seconds(secs_ago)).timestamp();

    for (i, v) in [95.0, 97.0, 99.8].into_iter().enumerate() {
        store
            .record_at(Namespace::Host, "cpu", v, ts(120 - i as i64 * 60))
            .unwrap();
    }
    store.record_at(Namespace::Host, "mem", 95.0, ts(0)).unwrap();
    store.record_at(Namespace::Host, "temp", 80.0, ts(0)).unwrap();
    store
        .record_at(Namespace::Process, "nginx", ProcessState::Down, ts(0))
        .unwrap();

    let engine = AlarmEngine::new(AlarmConfig::from_yaml_str(VALID_DOC).unwrap());
    let alarms = engine.evaluate(&store, now);

    let summary: Vec<(&str, &str, bool)> = alarms
        .iter()
        .map(|a| {
            (
                a.metric_display_name.as_str(),
                a.threshold_description.as_str(),
                a.is_process_alarm,
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("CPU usage", "CPU above 90% for three polls", false),
            ("CPU usage", "CPU pegged", false),
            ("Memory", "Memory nearly full", false),
            ("Nginx", "nginx is down", true),
        ]
    );
    assert_eq!(alarms[0].observed_value, AlarmValue::Number(99.8));
}

#[test]
fn engine_skips_configured_keys_without_history() {
    let dir = TempDir::new().unwrap();
    let store = store_with(&dir);
    let engine = AlarmEngine::new(AlarmConfig::from_yaml_str(VALID_DOC).unwrap());
    assert!(engine.evaluate(&store, Utc::now()).is_empty());
}

// ── Rendering ──

fn alarm(name: &str, process: bool) -> AlarmRecord {
    AlarmRecord {
        metric_display_name: name.into(),
        threshold_description: format!("{name} rule"),
        threshold_value: AlarmValue::Number(90.0),
        observed_value: AlarmValue::Number(95.25),
        is_process_alarm: process,
    }
}

#[test]
fn render_returns_none_without_alarms() {
    assert!(render("raspberrypi", &[]).is_none());
}

#[test]
fn render_emits_one_block_per_alarm_in_order() {
    let alarms = vec![alarm("CPU", false), alarm("Nginx", true), alarm("Memory", false)];
    let message = render("raspberrypi", &alarms).unwrap();

    assert!(message.starts_with("⚠️ ALARM: <code>raspberrypi</code>"));
    assert!(message.ends_with("Please look at the affected host(s)"));

    let first = message.find("1) <code>Name: CPU").unwrap();
    let second = message.find("2) <code>Name: Nginx").unwrap();
    let third = message.find("3) <code>Name: Memory").unwrap();
    assert!(first < second && second < third);
    assert_eq!(message.matches(" -- \n").count(), 3);

    let nginx_block = &message[second..third];
    assert!(nginx_block.contains("Type: Process"));
    assert!(nginx_block.contains("Desc: Nginx rule"));
    assert!(nginx_block.contains("Threshold: 90"));
    assert!(nginx_block.contains("Current: 95.25"));
    assert!(message[first..second].contains("Type: Host"));
}

#[test]
fn render_is_idempotent() {
    let alarms = vec![alarm("CPU", false), alarm("Nginx", true)];
    assert_eq!(render("pi", &alarms), render("pi", &alarms));
}

#[test]
fn render_escapes_markup_in_user_text() {
    let mut record = alarm("Disk <root>", false);
    record.threshold_description = "used & growing".into();
    let message = render("pi", &[record]).unwrap();
    assert!(message.contains("Name: Disk &lt;root&gt;"));
    assert!(message.contains("Desc: used &amp; growing"));
    assert_eq!(escape_html("a<b>&c"), "a&lt;b&gt;&amp;c");
}

#[test]
fn alarm_values_display_compactly() {
    assert_eq!(AlarmValue::Number(95.0).to_string(), "95");
    assert_eq!(AlarmValue::Number(37.599998).to_string(), "37.6");
    assert_eq!(AlarmValue::State(ProcessState::Down).to_string(), "down");
    assert_eq!(AlarmValue::Count(3).to_string(), "3");
}
