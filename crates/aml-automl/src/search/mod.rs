//! Built-in search backends and their shared candidate evaluation.

mod evolutionary;
mod random;
mod space;

use std::time::{Duration, Instant};

use ndarray::Array2;
use rayon::prelude::*;

pub use evolutionary::Evolutionary;
pub use random::RandomSearch;

use crate::backend::{SearchOutcome, SearchSettings};
use crate::cv::{Fold, cross_val_score, stratified_folds};
use crate::error::{AutoMlError, Result};
use crate::estimators::CandidateSpec;
use crate::pipeline::FittedPipeline;

/// Scores candidates with cross-validation on a fixed worker pool.
pub(crate) struct Evaluator<'a> {
    x: &'a Array2<f64>,
    y: &'a [i64],
    folds: Vec<Fold>,
    settings: &'a SearchSettings,
    pool: rayon::ThreadPool,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(x: &'a Array2<f64>, y: &'a [i64], settings: &'a SearchSettings) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(AutoMlError::InvalidInput(format!(
                "{} feature rows but {} targets",
                x.nrows(),
                y.len()
            )));
        }
        let folds = stratified_folds(y, settings.cv_folds, settings.random_state)?;

        // rayon treats zero threads as "one per core".
        let threads = usize::try_from(settings.n_jobs).unwrap_or(0);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("aml-search-{i}"))
            .build()
            .map_err(|e| AutoMlError::ThreadPool(e.to_string()))?;

        tracing::debug!(
            folds = folds.len(),
            threads = pool.current_num_threads(),
            "candidate evaluator ready"
        );

        Ok(Self {
            x,
            y,
            folds,
            settings,
            pool,
        })
    }

    /// Smallest training fold, which bounds the neighbour count.
    pub(crate) fn min_train_rows(&self) -> usize {
        self.folds.iter().map(|f| f.train.len()).min().unwrap_or(0)
    }

    /// Cross-validated score of each candidate; failures score `-inf`.
    pub(crate) fn evaluate(&self, batch: &[CandidateSpec]) -> Vec<f64> {
        self.pool.install(|| {
            batch
                .par_iter()
                .map(|spec| {
                    match cross_val_score(spec, self.x, self.y, &self.folds, self.settings.scoring) {
                        Ok(score) => {
                            tracing::trace!(candidate = %spec, score, "evaluated candidate");
                            score
                        }
                        Err(error) => {
                            tracing::debug!(candidate = %spec, %error, "candidate failed");
                            f64::NEG_INFINITY
                        }
                    }
                })
                .collect()
        })
    }
}

/// Best candidate seen so far.
#[derive(Debug, Default)]
pub(crate) struct Leaderboard {
    best: Option<(CandidateSpec, f64)>,
    evaluated: usize,
}

impl Leaderboard {
    /// Record a batch; returns true when the best score strictly improved.
    pub(crate) fn offer(&mut self, batch: &[CandidateSpec], scores: &[f64]) -> bool {
        let mut improved = false;
        for (spec, &score) in batch.iter().zip(scores) {
            self.evaluated += 1;
            if !score.is_finite() {
                continue;
            }
            if self.best.as_ref().is_none_or(|(_, best)| score > *best) {
                tracing::debug!(candidate = %spec, score, "new best candidate");
                self.best = Some((spec.clone(), score));
                improved = true;
            }
        }
        improved
    }

    pub(crate) fn best_score(&self) -> f64 {
        self.best.as_ref().map_or(f64::NEG_INFINITY, |(_, s)| *s)
    }

    /// No candidate can do better than a perfect score.
    pub(crate) fn is_perfect(&self) -> bool {
        self.best_score() >= 1.0
    }

    /// Refit the winner on every row.
    pub(crate) fn finish(self, x: &Array2<f64>, y: &[i64], started: Instant) -> Result<SearchOutcome> {
        let Some((spec, cv_score)) = self.best else {
            return Err(AutoMlError::NoViableCandidate {
                evaluated: self.evaluated,
            });
        };
        let pipeline = FittedPipeline::fit(spec, x, y)?;
        let elapsed = started.elapsed();
        tracing::info!(
            pipeline = %pipeline.spec(),
            cv_score,
            evaluated = self.evaluated,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "search finished"
        );
        Ok(SearchOutcome {
            pipeline,
            cv_score,
            evaluated: self.evaluated,
            elapsed,
        })
    }
}

pub(crate) fn budget_spent(started: Instant, budget: Duration) -> bool {
    started.elapsed() >= budget
}
