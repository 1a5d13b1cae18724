//! Error types for data ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during data ingestion operations.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Decoding Errors ===
    /// The configured encoding label is not known.
    #[error("unsupported encoding '{encoding}' for {path}")]
    UnsupportedEncoding { path: PathBuf, encoding: String },

    /// File bytes are not valid in the configured encoding.
    #[error("file {path} is not valid {encoding}")]
    Decode { path: PathBuf, encoding: String },

    // === CSV Parsing Errors ===
    /// Failed to parse CSV structure.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV has no usable header row.
    #[error("could not detect header row in {path}")]
    NoHeaderDetected { path: PathBuf },

    /// A header cell is blank.
    #[error("CSV {path} has an empty column name at position {position}")]
    EmptyColumnName { path: PathBuf, position: usize },

    /// A header name appears twice.
    #[error("CSV {path} has duplicate column '{column}'")]
    DuplicateColumn { path: PathBuf, column: String },

    // === DataFrame Errors ===
    /// Column not found in DataFrame.
    #[error("column '{column}' not found in DataFrame")]
    ColumnNotFound { column: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    // === Label Encoder Errors ===
    /// Label encoder payload could not be encoded or decoded.
    #[error("label encoder {path} is unreadable: {message}")]
    LabelEncoder { path: PathBuf, message: String },

    /// Label encoder artifact could not be stored or fetched.
    #[error(transparent)]
    Persistence(#[from] aml_persistence::PersistenceError),
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
