//! Hyperparameter space: sampling, mutation and crossover of candidates.

use rand::Rng;

use crate::estimators::{CandidateSpec, Weighting};

const MAX_DEPTH: u32 = 20;
const MAX_LEAF: u32 = 20;
const MAX_NEIGHBOURS: u32 = 30;

/// Bounds derived from the training data.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchSpace {
    max_k: u32,
}

impl SearchSpace {
    /// `min_train_rows` is the smallest training fold size.
    pub(crate) fn new(min_train_rows: usize) -> Self {
        let rows = u32::try_from(min_train_rows).unwrap_or(u32::MAX);
        Self {
            max_k: rows.clamp(1, MAX_NEIGHBOURS),
        }
    }

    /// One reasonable configuration per family, tried first.
    pub(crate) fn defaults(&self) -> Vec<CandidateSpec> {
        vec![
            CandidateSpec::GaussianNb { var_smoothing: 1e-9 },
            CandidateSpec::Knn {
                k: 5u32.min(self.max_k),
                weighting: Weighting::Uniform,
            },
            CandidateSpec::NearestCentroid,
            CandidateSpec::DecisionTree {
                max_depth: 10,
                min_samples_leaf: 1,
            },
        ]
    }

    pub(crate) fn sample<R: Rng>(&self, rng: &mut R) -> CandidateSpec {
        match rng.gen_range(0..4) {
            0 => CandidateSpec::GaussianNb {
                var_smoothing: 10f64.powf(rng.gen_range(-12.0..-3.0)),
            },
            1 => CandidateSpec::Knn {
                k: rng.gen_range(1..=self.max_k),
                weighting: random_weighting(rng),
            },
            2 => CandidateSpec::NearestCentroid,
            _ => CandidateSpec::DecisionTree {
                max_depth: rng.gen_range(1..=MAX_DEPTH),
                min_samples_leaf: rng.gen_range(1..=MAX_LEAF),
            },
        }
    }

    /// Perturb one hyperparameter, or occasionally switch family.
    pub(crate) fn mutate<R: Rng>(&self, spec: &CandidateSpec, rng: &mut R) -> CandidateSpec {
        if rng.gen_bool(0.2) {
            return self.sample(rng);
        }
        match *spec {
            CandidateSpec::GaussianNb { var_smoothing } => {
                let exponent = (var_smoothing.log10() + rng.gen_range(-1.5..1.5)).clamp(-12.0, -3.0);
                CandidateSpec::GaussianNb {
                    var_smoothing: 10f64.powf(exponent),
                }
            }
            CandidateSpec::Knn { k, weighting } => {
                if rng.gen_bool(0.5) {
                    CandidateSpec::Knn {
                        k: step(k, rng, 1, self.max_k),
                        weighting,
                    }
                } else {
                    CandidateSpec::Knn {
                        k: k.min(self.max_k),
                        weighting: random_weighting(rng),
                    }
                }
            }
            CandidateSpec::NearestCentroid => self.sample(rng),
            CandidateSpec::DecisionTree {
                max_depth,
                min_samples_leaf,
            } => {
                if rng.gen_bool(0.5) {
                    CandidateSpec::DecisionTree {
                        max_depth: step(max_depth, rng, 1, MAX_DEPTH),
                        min_samples_leaf,
                    }
                } else {
                    CandidateSpec::DecisionTree {
                        max_depth,
                        min_samples_leaf: step(min_samples_leaf, rng, 1, MAX_LEAF),
                    }
                }
            }
        }
    }

    /// Mix hyperparameters of two parents of the same family; otherwise pick one.
    pub(crate) fn crossover<R: Rng>(&self, a: &CandidateSpec, b: &CandidateSpec, rng: &mut R) -> CandidateSpec {
        match (a, b) {
            (CandidateSpec::Knn { k, .. }, CandidateSpec::Knn { weighting, .. }) => CandidateSpec::Knn {
                k: *k,
                weighting: *weighting,
            },
            (
                CandidateSpec::DecisionTree { max_depth, .. },
                CandidateSpec::DecisionTree { min_samples_leaf, .. },
            ) => CandidateSpec::DecisionTree {
                max_depth: *max_depth,
                min_samples_leaf: *min_samples_leaf,
            },
            _ if rng.gen_bool(0.5) => a.clone(),
            _ => b.clone(),
        }
    }
}

fn random_weighting<R: Rng>(rng: &mut R) -> Weighting {
    if rng.gen_bool(0.5) {
        Weighting::Uniform
    } else {
        Weighting::Distance
    }
}

/// Move `value` by up to three steps, staying within `[lo, hi]`.
fn step<R: Rng>(value: u32, rng: &mut R, lo: u32, hi: u32) -> u32 {
    let delta = rng.gen_range(1..=3);
    if rng.gen_bool(0.5) {
        value.saturating_add(delta).clamp(lo, hi)
    } else {
        value.saturating_sub(delta).clamp(lo, hi)
    }
}
