use pimon_common::types::Namespace;
use std::path::PathBuf;

/// Errors raised while loading or persisting the telemetry document.
///
/// # Examples
///
/// ```rust
/// use pimon_storage::error::StorageError;
/// use std::io;
///
/// let err = StorageError::ResourceMissing {
///     path: "storage/monitoring_telemetry.json".into(),
///     source: io::Error::from(io::ErrorKind::PermissionDenied),
/// };
/// assert!(err.to_string().starts_with("Illegal: Resource Missing::"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The telemetry location exists but cannot be read (or created).
    #[error("Illegal: Resource Missing:: telemetry data at path {} is unreadable: {source}", .path.display())]
    ResourceMissing {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing the document back to disk failed.
    #[error("Storage: failed to write telemetry data to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The stored document is not valid telemetry JSON.
    #[error("Storage: telemetry data at {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// NaN and infinities have no JSON form and would corrupt the document.
    #[error("Storage: refusing non-finite sample {value} for {namespace}.{key}")]
    NonFiniteSample {
        namespace: Namespace,
        key: String,
        value: f64,
    },

    #[error("Storage: failed to encode telemetry data: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
