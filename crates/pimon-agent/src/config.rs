use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/agent.toml";

/// Why the agent configuration could not be used.
#[derive(Debug, thiserror::Error)]
pub enum AgentConfigError {
    #[error("Illegal: Resource Missing:: agent config at path {} is unreadable: {source}", .path.display())]
    ResourceMissing {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Illegal: Unrecognized:: agent config at path {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// YAML alarm document with `host` and `process` sections.
    #[serde(default = "default_alarms_path")]
    pub alarms_path: PathBuf,
    /// JSON telemetry document, created on first run.
    #[serde(default = "default_telemetry_path")]
    pub telemetry_path: PathBuf,
    /// Directory for `execution.log`; console only when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Samples kept per metric key.
    #[serde(default = "default_max_retained")]
    pub max_retained: usize,
    /// Overrides the OS host name in alarm messages.
    #[serde(default)]
    pub hostname: Option<String>,
}

fn default_alarms_path() -> PathBuf {
    PathBuf::from("config/alarms.yaml")
}

fn default_telemetry_path() -> PathBuf {
    PathBuf::from("storage/monitoring_telemetry.json")
}

fn default_max_retained() -> usize {
    pimon_storage::DEFAULT_MAX_RETAINED
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            alarms_path: default_alarms_path(),
            telemetry_path: default_telemetry_path(),
            log_dir: None,
            max_retained: default_max_retained(),
            hostname: None,
        }
    }
}

impl AgentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AgentConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| AgentConfigError::ResourceMissing {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&content).map_err(|e| AgentConfigError::Invalid {
            path: path.to_path_buf(),
            reason: format!("{e:#}"),
        })
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        anyhow::ensure!(config.max_retained > 0, "max_retained must be at least 1");
        Ok(config)
    }

    /// Loads the config named on the command line, or the default path.
    ///
    /// When no path was given and the default file does not exist, built-in
    /// defaults are used.
    pub fn resolve(cli_path: Option<&str>) -> Result<Self, AgentConfigError> {
        match cli_path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }
}
