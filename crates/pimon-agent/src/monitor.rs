use crate::config::AgentConfig;
use chrono::Utc;
use pimon_alert::summary::render;
use pimon_alert::{AlarmConfig, AlarmConfigError, AlarmEngine, AlarmRecord};
use pimon_collector::Collector;
use pimon_notify::{NotificationChannel, NotifyError};
use pimon_storage::{StorageError, TelemetryStore};

/// Why a run could not complete.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] AlarmConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("alarm notification could not be delivered: {0}")]
    Notify(#[from] NotifyError),
}

impl RunError {
    /// Text to relay through the notification channel, if relaying makes sense.
    pub fn relay_message(&self) -> Option<String> {
        match self {
            // Already one `🔥`-prefixed line per issue.
            RunError::Config(AlarmConfigError::Invalid(e)) => Some(e.to_string()),
            RunError::Config(e) => Some(format!("🔥 {e}")),
            RunError::Storage(e) => Some(format!("🔥 {e}")),
            // The channel itself is what failed.
            RunError::Notify(_) => None,
        }
    }
}

/// Outcome of one successful run.
#[derive(Debug)]
pub struct RunReport {
    /// Samples written to the telemetry store.
    pub recorded: usize,
    pub alarms: Vec<AlarmRecord>,
    /// The alarm message that was sent, if any.
    pub message: Option<String>,
}

/// One-shot driver: collect, record, evaluate, notify.
pub struct Monitor {
    config: AgentConfig,
    collectors: Vec<Box<dyn Collector>>,
    channel: Box<dyn NotificationChannel>,
    host: String,
}

impl Monitor {
    pub fn new(
        config: AgentConfig,
        collectors: Vec<Box<dyn Collector>>,
        channel: Box<dyn NotificationChannel>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            config,
            collectors,
            channel,
            host: host.into(),
        }
    }

    /// Runs once, relaying any fatal error through the notification channel
    /// before returning it.
    pub async fn execute(&mut self) -> Result<RunReport, RunError> {
        tracing::info!(host = %self.host, "Execution started");

        let result = self.run_once().await;
        match &result {
            Ok(report) => tracing::info!(
                recorded = report.recorded,
                alarms = report.alarms.len(),
                "Execution finished"
            ),
            Err(e) => {
                tracing::error!(error = %e, "Run failed");
                if let Some(message) = e.relay_message() {
                    relay_failure(self.channel.as_ref(), &message).await;
                }
                tracing::info!("Execution finished with errors");
            }
        }
        result
    }

    pub async fn run_once(&mut self) -> Result<RunReport, RunError> {
        let alarm_config = AlarmConfig::load(&self.config.alarms_path)?;
        if alarm_config.is_empty() {
            tracing::warn!(path = %self.config.alarms_path.display(), "No alarms configured");
        }

        let mut store = TelemetryStore::open(&self.config.telemetry_path, self.config.max_retained)?;

        let mut recorded = 0;
        for collector in &mut self.collectors {
            let namespace = collector.namespace();
            let keys = alarm_config.keys(namespace);
            if keys.is_empty() {
                continue;
            }

            match collector.collect(&keys) {
                Ok(snapshot) => {
                    tracing::debug!(collector = collector.name(), count = snapshot.len(), "Collected metrics");
                    recorded += store.record_snapshot(namespace, &snapshot)?;
                }
                Err(e) => {
                    tracing::warn!(collector = collector.name(), error = %e, "Collection failed")
                }
            }
        }

        let engine = AlarmEngine::new(alarm_config);
        let alarms = engine.evaluate(&store, Utc::now());

        let message = render(&self.host, &alarms);
        if let Some(text) = &message {
            self.channel.send(text).await?;
            tracing::info!(
                channel = self.channel.channel_name(),
                alarms = alarms.len(),
                "Alarm summary sent"
            );
        }

        Ok(RunReport {
            recorded,
            alarms,
            message,
        })
    }
}

/// Best-effort delivery of a failure report. Delivery problems are logged,
/// never raised.
pub async fn relay_failure(channel: &dyn NotificationChannel, message: &str) {
    if let Err(e) = channel.send(message).await {
        tracing::error!(
            channel = channel.channel_name(),
            error = %e,
            "Failed to relay error notification"
        );
    }
}
