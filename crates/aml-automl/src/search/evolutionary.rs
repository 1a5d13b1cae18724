//! Generational search with tournament selection, crossover and mutation.

use std::time::Instant;

use ndarray::Array2;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::space::SearchSpace;
use super::{Evaluator, Leaderboard, budget_spent};
use crate::backend::{AutoMlBackend, SearchOutcome, SearchSettings};
use crate::error::Result;
use crate::estimators::CandidateSpec;

const ELITES: usize = 2;
const TOURNAMENT: usize = 3;
const CROSSOVER_RATE: f64 = 0.1;
const MUTATION_RATE: f64 = 0.9;

/// Evolves a population for `generations` rounds of `population_size`.
///
/// The best two individuals survive unchanged into the next generation and
/// keep their scores. The time budget is checked after every generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evolutionary;

struct Individual {
    spec: CandidateSpec,
    score: Option<f64>,
}

fn tournament<'p, R: Rng>(population: &'p [Individual], rng: &mut R) -> &'p CandidateSpec {
    let mut best = &population[rng.gen_range(0..population.len())];
    for _ in 1..TOURNAMENT {
        let challenger = &population[rng.gen_range(0..population.len())];
        if challenger.score.unwrap_or(f64::NEG_INFINITY) > best.score.unwrap_or(f64::NEG_INFINITY) {
            best = challenger;
        }
    }
    &best.spec
}

impl AutoMlBackend for Evolutionary {
    fn name(&self) -> &'static str {
        "evolutionary"
    }

    fn search(&self, x: &Array2<f64>, y: &[i64], settings: &SearchSettings) -> Result<SearchOutcome> {
        let started = Instant::now();
        let evaluator = Evaluator::new(x, y, settings)?;
        let space = SearchSpace::new(evaluator.min_train_rows());
        let mut rng = ChaCha8Rng::seed_from_u64(settings.random_state);
        let mut board = Leaderboard::default();
        let size = settings.population_size.max(ELITES + 1);

        tracing::info!(
            rows = y.len(),
            features = x.ncols(),
            generations = settings.generations,
            population = size,
            scoring = %settings.scoring,
            "starting evolutionary search"
        );

        let mut population: Vec<Individual> = space
            .defaults()
            .into_iter()
            .chain(std::iter::repeat_with(|| space.sample(&mut rng)))
            .take(size)
            .map(|spec| Individual { spec, score: None })
            .collect();

        for generation in 0..settings.generations {
            let pending: Vec<CandidateSpec> = population
                .iter()
                .filter(|i| i.score.is_none())
                .map(|i| i.spec.clone())
                .collect();
            let scores = evaluator.evaluate(&pending);
            board.offer(&pending, &scores);

            let mut fresh = scores.into_iter();
            for individual in population.iter_mut().filter(|i| i.score.is_none()) {
                individual.score = fresh.next();
            }

            tracing::debug!(generation, best = board.best_score(), "generation evaluated");

            if board.is_perfect() || budget_spent(started, settings.time_budget) {
                break;
            }
            if generation + 1 == settings.generations {
                break;
            }

            population.sort_by(|a, b| {
                b.score
                    .unwrap_or(f64::NEG_INFINITY)
                    .total_cmp(&a.score.unwrap_or(f64::NEG_INFINITY))
            });

            let mut next: Vec<Individual> = population
                .iter()
                .take(ELITES)
                .map(|i| Individual {
                    spec: i.spec.clone(),
                    score: i.score,
                })
                .collect();
            while next.len() < size {
                let parent = tournament(&population, &mut rng);
                let mut child = if rng.gen_bool(CROSSOVER_RATE) {
                    let other = tournament(&population, &mut rng);
                    space.crossover(parent, other, &mut rng)
                } else {
                    parent.clone()
                };
                if rng.gen_bool(MUTATION_RATE) {
                    child = space.mutate(&child, &mut rng);
                }
                next.push(Individual {
                    spec: child,
                    score: None,
                });
            }
            population = next;
        }

        board.finish(x, y, started)
    }
}
