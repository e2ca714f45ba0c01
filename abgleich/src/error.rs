//! Error types for the abgleich crate

use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reconciling address datasets
#[derive(Debug, Error)]
pub enum AbgleichError {
    /// I/O error while reading an input or writing an output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required source file for a state is absent
    #[error("Missing input file: {0}")]
    MissingInput(String),

    /// Corrections file exists but cannot be parsed
    #[error("Invalid corrections file {file}: {reason}")]
    InvalidCorrections { file: String, reason: String },

    /// Persisted history cannot be parsed
    #[error("Invalid history file {file}: {reason}")]
    InvalidHistory { file: String, reason: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AbgleichError {
    /// Creates a missing-input error from a path
    pub fn missing_input(path: &Path) -> Self {
        Self::MissingInput(path.display().to_string())
    }

    /// Creates an invalid-corrections error with context
    pub fn invalid_corrections(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCorrections {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-history error with context
    pub fn invalid_history(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHistory {
            file: file.into(),
            reason: reason.into(),
        }
    }
}
