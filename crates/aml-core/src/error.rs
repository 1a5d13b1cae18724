//! Error types for the skill lifecycle.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`crate::Skill`] operations.
#[derive(Debug, Error)]
pub enum SkillError {
    /// The directory is missing or none of its files were usable.
    #[error("no usable data in {path}")]
    DataUnavailable { path: PathBuf },

    /// Fewer than two target classes.
    #[error("data must have at least 2 classes, found only '{class}'")]
    InsufficientClasses { class: String },

    /// Some class is below the configured minimum share.
    #[error("not enough training examples per class: {details}")]
    ClassImbalance { details: String },

    /// The operation needs a trained model.
    #[error("no trained model; run train first")]
    ModelNotTrained,

    /// Data or predict input does not fit the trained feature schema.
    #[error("input does not match the trained schema: {message}")]
    SchemaMismatch { message: String },

    /// Predict input is not valid JSON or not an object/array of objects.
    #[error("invalid predict input: {message}")]
    InvalidInput { message: String },

    /// The model artifact payload could not be encoded or decoded.
    #[error("model artifact {path} is unreadable: {message}")]
    Artifact { path: PathBuf, message: String },

    /// The pipeline description could not be written.
    #[error("failed to write {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Backend(#[from] aml_automl::AutoMlError),

    #[error(transparent)]
    Ingest(#[from] aml_ingest::IngestError),

    #[error(transparent)]
    Persistence(#[from] aml_persistence::PersistenceError),

    #[error(transparent)]
    Config(#[from] aml_config::ConfigError),
}

impl From<polars::prelude::PolarsError> for SkillError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::SchemaMismatch {
            message: err.to_string(),
        }
    }
}

/// Result type for skill operations.
pub type Result<T> = std::result::Result<T, SkillError>;
