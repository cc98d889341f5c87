//! Delivery of pre-formatted alarm and error messages.
//!
//! The monitor only depends on the [`NotificationChannel`] capability:
//! send one message, learn whether it was delivered. The Telegram channel
//! is the real transport; [`channels::log::LogChannel`] stands in when no
//! credentials are configured.

pub mod channels;
pub mod error;
pub mod utils;


use async_trait::async_trait;

pub use error::{NotifyError, Result};

/// A destination for formatted messages.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Delivers `message`. An empty message is a successful no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails after retries (if applicable).
    async fn send(&self, message: &str) -> Result<()>;

    /// Returns the channel type name (e.g., `"telegram"`).
    fn channel_name(&self) -> &str;
}
