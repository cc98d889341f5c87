use crate::error::Result;
use crate::NotificationChannel;
use async_trait::async_trait;

/// Writes messages to the log instead of delivering them anywhere.
#[derive(Debug, Default)]
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn send(&self, message: &str) -> Result<()> {
        if message.is_empty() {
            return Ok(());
        }
        tracing::warn!(%message, "No notification transport configured, message logged only");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}
