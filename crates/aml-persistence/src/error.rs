//! Persistence error types.

use std::path::PathBuf;
use thiserror::Error;

/// Persistence operation error.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// File I/O error.
    #[error("failed to {operation} file {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exists but is not an artifact written by this tool.
    #[error("invalid artifact {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    /// Artifact was written by a newer schema.
    #[error("artifact {path} has version {found}, maximum supported is {max_supported}")]
    UnsupportedVersion {
        found: u32,
        max_supported: u32,
        path: PathBuf,
    },

    /// Artifact holds a different kind of payload than requested.
    #[error("artifact {path} holds a {found}, expected a {expected}")]
    WrongKind {
        path: PathBuf,
        expected: &'static str,
        found: &'static str,
    },

    /// DataFrame could not be written as CSV.
    #[error("failed to write dataset {path}: {message}")]
    DatasetWrite { path: PathBuf, message: String },

    /// Atomic write failed (temp file couldn't be renamed).
    #[error("failed to move {temp_path} into place at {target_path}: {source}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersistenceError {
    pub(crate) fn io(operation: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
