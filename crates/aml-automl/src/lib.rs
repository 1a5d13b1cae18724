//! Pipeline search for tabular classification.
//!
//! Given a numeric feature matrix (NaN for missing cells) and integer class
//! codes, a backend searches `impute -> estimator` pipelines with stratified
//! k-fold cross-validation and returns the best one refitted on all rows.
//!
//! # Backends
//!
//! - [`RandomSearch`]: time-budgeted batches of random candidates
//! - [`Evolutionary`]: generations of selection, crossover and mutation
//!
//! Candidate scoring runs on a rayon pool sized by `n_jobs`.
//!
//! # Example
//!
//! ```ignore
//! use aml_automl::{SearchSettings, backend_for};
//! use aml_config::Config;
//!
//! let config = Config::default();
//! let backend = backend_for(config.backend);
//! let outcome = backend.search(&x, &y, &SearchSettings::from_config(&config))?;
//! let predictions = outcome.pipeline.predict(&x)?;
//! ```

mod backend;
mod cv;
mod error;
mod estimators;
mod imputer;
mod metrics;
mod pipeline;
mod search;

// === Error Types ===
pub use error::{AutoMlError, Result};

// === Backend Interface ===
pub use backend::{AutoMlBackend, SearchOutcome, SearchSettings, backend_for};
pub use search::{Evolutionary, RandomSearch};

// === Pipeline ===
pub use estimators::{CandidateSpec, DecisionTree, Estimator, GaussianNb, Knn, NearestCentroid, Weighting};
pub use imputer::MeanImputer;
pub use pipeline::FittedPipeline;

// === Evaluation ===
pub use cv::{Fold, cross_val_score, stratified_folds};
pub use metrics::{accuracy, balanced_accuracy, f1_macro, score};
