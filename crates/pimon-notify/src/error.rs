/// Errors that can occur while delivering a notification.
///
/// # Examples
///
/// ```rust
/// use pimon_notify::error::NotifyError;
///
/// let err = NotifyError::InvalidConfig("PI_BOT_TOKEN is not set".to_string());
/// assert!(err.to_string().contains("PI_BOT_TOKEN"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Channel configuration is missing a required value.
    #[error("Notify: invalid channel configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP request to the messaging service failed.
    #[error("Notify: HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The messaging service answered, but refused the message.
    #[error("Notify: API error from {service}: status={status}, body={body}")]
    ApiError {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Notify: JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
