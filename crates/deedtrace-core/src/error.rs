//! Error types for the reconciliation engine

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Error type for capture ingestion and configuration handling.
///
/// Per-field anomalies in extraction output never surface here: they degrade
/// the affected field to its absent sentinel instead. Only violations of the
/// top-level capture contract and configuration problems are hard errors.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Capture payload violates the top-level contract (non-object payload,
    /// missing `entities`/`summary`, non-object `entities`)
    #[error("Malformed capture payload: {reason}")]
    MalformedCapture {
        /// Description of the contract violation
        reason: String,
    },

    /// Engine configuration failed validation
    #[error("Invalid engine configuration: {reason}")]
    Config {
        /// Description of the validation failure
        reason: String,
    },

    /// Failed to read a configuration file from disk
    #[error("Failed to read config file {path}: {source}")]
    ConfigIo {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON
    #[error("Invalid JSON in config file {path}: {source}")]
    ConfigFormat {
        /// Path to the file with invalid contents
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },
}

impl CoreError {
    /// Create a malformed-capture error
    #[inline]
    #[must_use = "returns CoreError for contract violations"]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedCapture {
            reason: reason.into(),
        }
    }

    /// Create a configuration validation error
    #[inline]
    #[must_use = "returns CoreError for invalid configuration"]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create a config file read error
    #[inline]
    #[must_use = "returns CoreError for config read failures"]
    pub fn config_io<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        Self::ConfigIo {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
