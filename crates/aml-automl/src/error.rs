//! Error types for pipeline search and fitting.

use thiserror::Error;

/// Errors raised while fitting estimators or searching candidates.
#[derive(Debug, Error)]
pub enum AutoMlError {
    /// Feature matrix and target disagree in length or are empty.
    #[error("invalid training input: {0}")]
    InvalidInput(String),

    /// Too few rows for the requested operation.
    #[error("need at least {needed} samples, got {found}")]
    NotEnoughSamples { needed: usize, found: usize },

    /// Prediction input does not match the fitted feature count.
    #[error("expected {expected} features, got {found}")]
    FeatureCount { expected: usize, found: usize },

    /// Every evaluated candidate failed.
    #[error("no candidate pipeline could be fitted ({evaluated} evaluated)")]
    NoViableCandidate { evaluated: usize },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Result type for search operations.
pub type Result<T> = std::result::Result<T, AutoMlError>;
