use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failures surfaced by the storage layer.
///
/// Every store-level failure is returned to the caller, which decides whether
/// it is fatal. "No matching record" is not an error: reads return `None` and
/// writes report zero counts.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Storage is not connected")]
    NotConnected,

    #[error("Storage operation `{operation}` timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Storage operation `{operation}` failed: {source}")]
    OperationFailed {
        operation: &'static str,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("Update contains no fields to set")]
    EmptyUpdate,

    #[error("Storage returned a non-ObjectId identifier for `{0}`")]
    UnexpectedId(&'static str),
}

impl StorageError {
    pub fn is_not_connected(&self) -> bool {
        matches!(self, StorageError::NotConnected)
    }
}
