//! Error taxonomy for the agent core
//!
//! Radio and persistence errors are recoverable and only ever logged by the
//! orchestrator. Configuration errors are fatal, and only at startup.

use std::path::PathBuf;
use thiserror::Error;

/// Transient failures reported by the radio I/O collaborator
#[derive(Debug, Error)]
pub enum RadioError {
    #[error("radio operation timed out")]
    Timeout,

    #[error("radio device busy: {0}")]
    Busy(String),

    #[error("radio device absent: {0}")]
    Absent(String),

    #[error("radio I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reading or writing the persisted learning store
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("learning store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("learning store is corrupt: {0}")]
    Corrupt(String),

    #[error("learning store checksum mismatch (expected {expected}, found {actual})")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("unsupported learning store schema version {0}")]
    UnsupportedVersion(u32),

    #[error("failed to serialize learning store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Invalid configuration, detected once at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
