//! The pluggable search backend interface.

use std::time::Duration;

use ndarray::Array2;

use aml_config::{BackendKind, Config, Scoring};

use crate::error::Result;
use crate::pipeline::FittedPipeline;
use crate::search::{Evolutionary, RandomSearch};

/// Knobs shared by every backend, taken from [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub scoring: Scoring,
    pub cv_folds: usize,
    /// Checked between candidate batches; a running batch is not interrupted.
    pub time_budget: Duration,
    /// Worker threads; `-1` means every core.
    pub n_jobs: i32,
    pub random_state: u64,
    pub population_size: usize,
    pub generations: usize,
}

impl SearchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scoring: config.scoring,
            cv_folds: config.cv_folds,
            time_budget: config.train_time_budget(),
            n_jobs: config.n_jobs,
            random_state: config.random_state,
            population_size: config.population_size,
            generations: config.generations,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Best pipeline found by a search, refitted on all rows.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub pipeline: FittedPipeline,
    /// Mean cross-validated score of the winning candidate.
    pub cv_score: f64,
    /// Candidates scored, including failures.
    pub evaluated: usize,
    pub elapsed: Duration,
}

/// A strategy that searches candidate pipelines for `(x, y)`.
///
/// `x` may contain NaN for missing values. `y` holds integer class codes.
pub trait AutoMlBackend: Send + Sync {
    /// Stable identifier recorded in the model artifact.
    fn name(&self) -> &'static str;

    fn search(&self, x: &Array2<f64>, y: &[i64], settings: &SearchSettings) -> Result<SearchOutcome>;
}

/// The built-in backend for a configured kind.
pub fn backend_for(kind: BackendKind) -> Box<dyn AutoMlBackend> {
    match kind {
        BackendKind::RandomSearch => Box::new(RandomSearch),
        BackendKind::Evolutionary => Box::new(Evolutionary),
    }
}
