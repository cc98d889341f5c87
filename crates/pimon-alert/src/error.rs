use std::path::PathBuf;

/// Classification of a single configuration defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// A required field is absent.
    Missing,
    /// A value (trend code, process state, threshold type) is not known.
    Unrecognized,
    /// Fields that cannot be combined were set together.
    Unresolvable,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueKind::Missing => write!(f, "Missing"),
            IssueKind::Unrecognized => write!(f, "Unrecognized"),
            IssueKind::Unresolvable => write!(f, "Unresolvable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub kind: IssueKind,
    pub message: String,
}

impl ConfigIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Illegal: {}:: {}", self.kind, self.message)
    }
}

/// Every defect found in one validation pass of the alarm document.
///
/// # Examples
///
/// ```rust
/// use pimon_alert::error::{ConfigError, ConfigIssue, IssueKind};
///
/// let err = ConfigError::new(vec![
///     ConfigIssue::new(IssueKind::Missing, "name for alarm host.cpu"),
///     ConfigIssue::new(IssueKind::Unrecognized, "trend gte in threshold #1 for alarm host.cpu"),
/// ]);
/// let text = err.to_string();
/// assert_eq!(text.lines().count(), 2);
/// assert!(text.contains("Illegal: Unrecognized:: trend gte"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", format_issues(.issues))]
pub struct ConfigError {
    pub issues: Vec<ConfigIssue>,
}

impl ConfigError {
    pub fn new(issues: Vec<ConfigIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[ConfigIssue] {
        &self.issues
    }
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("🔥 {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Failure to produce a usable alarm configuration.
#[derive(Debug, thiserror::Error)]
pub enum AlarmConfigError {
    #[error("Illegal: Resource Missing:: missing config at path {}: {source}", .path.display())]
    ResourceMissing {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    Invalid(#[from] ConfigError),
}
