//! Time-budgeted random search.

use std::time::Instant;

use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::space::SearchSpace;
use super::{Evaluator, Leaderboard, budget_spent};
use crate::backend::{AutoMlBackend, SearchOutcome, SearchSettings};
use crate::error::Result;

/// Batches without improvement before the search gives up early.
const PATIENCE: usize = 10;

/// Samples candidate batches until the time budget runs out.
///
/// The first batch holds one default configuration per estimator family.
/// Each later batch draws `population_size` random candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSearch;

impl AutoMlBackend for RandomSearch {
    fn name(&self) -> &'static str {
        "random-search"
    }

    fn search(&self, x: &Array2<f64>, y: &[i64], settings: &SearchSettings) -> Result<SearchOutcome> {
        let started = Instant::now();
        let evaluator = Evaluator::new(x, y, settings)?;
        let space = SearchSpace::new(evaluator.min_train_rows());
        let mut rng = ChaCha8Rng::seed_from_u64(settings.random_state);
        let mut board = Leaderboard::default();

        tracing::info!(
            rows = y.len(),
            features = x.ncols(),
            budget_secs = settings.time_budget.as_secs_f64(),
            scoring = %settings.scoring,
            "starting random search"
        );

        let mut batch = space.defaults();
        let mut stale = 0usize;
        for round in 1.. {
            let scores = evaluator.evaluate(&batch);
            if board.offer(&batch, &scores) {
                stale = 0;
            } else {
                stale += 1;
            }
            tracing::debug!(round, best = board.best_score(), stale, "batch evaluated");

            if board.is_perfect() || stale >= PATIENCE || budget_spent(started, settings.time_budget) {
                break;
            }
            batch = (0..settings.population_size).map(|_| space.sample(&mut rng)).collect();
        }

        board.finish(x, y, started)
    }
}
