//! Candidate estimators and their hyperparameters.
//!
//! A [`CandidateSpec`] is an unfitted estimator family plus hyperparameters;
//! fitting it produces an [`Estimator`]. Both are archived with `rkyv` as part
//! of the model artifact.

mod centroid;
mod knn;
mod naive_bayes;
mod tree;

use std::fmt;

use ndarray::Array2;
use rkyv::{Archive, Deserialize, Serialize};

pub use centroid::NearestCentroid;
pub use knn::Knn;
pub use naive_bayes::GaussianNb;
pub use tree::DecisionTree;

use crate::error::{AutoMlError, Result};

/// Neighbour vote weighting for [`Knn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum Weighting {
    Uniform,
    Distance,
}

impl Weighting {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Distance => "distance",
        }
    }
}

/// An estimator family with concrete hyperparameters.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub enum CandidateSpec {
    GaussianNb { var_smoothing: f64 },
    Knn { k: u32, weighting: Weighting },
    NearestCentroid,
    DecisionTree { max_depth: u32, min_samples_leaf: u32 },
}

impl CandidateSpec {
    /// Family name, stable across hyperparameter changes.
    pub fn family(&self) -> &'static str {
        match self {
            Self::GaussianNb { .. } => "gaussian_nb",
            Self::Knn { .. } => "knn",
            Self::NearestCentroid => "nearest_centroid",
            Self::DecisionTree { .. } => "decision_tree",
        }
    }

    /// Fit on an imputed feature matrix.
    pub fn fit(&self, x: &Array2<f64>, y: &[i64]) -> Result<Estimator> {
        check_input(x, y)?;
        Ok(match *self {
            Self::GaussianNb { var_smoothing } => Estimator::GaussianNb(GaussianNb::fit(x, y, var_smoothing)),
            Self::Knn { k, weighting } => Estimator::Knn(Knn::fit(x, y, k, weighting)?),
            Self::NearestCentroid => Estimator::NearestCentroid(NearestCentroid::fit(x, y)),
            Self::DecisionTree {
                max_depth,
                min_samples_leaf,
            } => Estimator::DecisionTree(DecisionTree::fit(x, y, max_depth, min_samples_leaf)),
        })
    }
}

impl fmt::Display for CandidateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GaussianNb { var_smoothing } => write!(f, "gaussian_nb(var_smoothing={var_smoothing:.1e})"),
            Self::Knn { k, weighting } => write!(f, "knn(k={k}, weights={})", weighting.as_str()),
            Self::NearestCentroid => write!(f, "nearest_centroid"),
            Self::DecisionTree {
                max_depth,
                min_samples_leaf,
            } => write!(f, "decision_tree(max_depth={max_depth}, min_samples_leaf={min_samples_leaf})"),
        }
    }
}

/// A fitted estimator.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub enum Estimator {
    GaussianNb(GaussianNb),
    Knn(Knn),
    NearestCentroid(NearestCentroid),
    DecisionTree(DecisionTree),
}

impl Estimator {
    /// Number of feature columns seen during fit.
    pub fn n_features(&self) -> usize {
        match self {
            Self::GaussianNb(m) => m.n_features(),
            Self::Knn(m) => m.n_features(),
            Self::NearestCentroid(m) => m.n_features(),
            Self::DecisionTree(m) => m.n_features(),
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<i64>> {
        if x.ncols() != self.n_features() {
            return Err(AutoMlError::FeatureCount {
                expected: self.n_features(),
                found: x.ncols(),
            });
        }
        Ok(match self {
            Self::GaussianNb(m) => m.predict(x),
            Self::Knn(m) => m.predict(x),
            Self::NearestCentroid(m) => m.predict(x),
            Self::DecisionTree(m) => m.predict(x),
        })
    }
}

fn check_input(x: &Array2<f64>, y: &[i64]) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(AutoMlError::InvalidInput(format!(
            "{} feature rows but {} targets",
            x.nrows(),
            y.len()
        )));
    }
    if y.is_empty() {
        return Err(AutoMlError::NotEnoughSamples { needed: 1, found: 0 });
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(AutoMlError::InvalidInput(
            "feature matrix contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

/// Sorted distinct classes.
pub(crate) fn distinct_classes(y: &[i64]) -> Vec<i64> {
    let mut classes = y.to_vec();
    classes.sort_unstable();
    classes.dedup();
    classes
}

/// Index of the largest score; the first one wins ties.
pub(crate) fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, s) in scores.iter().enumerate() {
        if *s > scores[best] {
            best = i;
        }
    }
    best
}


#[cfg(test)]
mod tests {
    use super::testing::blobs;
    use super::*;

    fn all_specs() -> Vec<CandidateSpec> {
        vec![
            CandidateSpec::GaussianNb { var_smoothing: 1e-9 },
            CandidateSpec::Knn {
                k: 3,
                weighting: Weighting::Uniform,
            },
            CandidateSpec::Knn {
                k: 5,
                weighting: Weighting::Distance,
            },
            CandidateSpec::NearestCentroid,
            CandidateSpec::DecisionTree {
                max_depth: 4,
                min_samples_leaf: 1,
            },
        ]
    }

    #[test]
    fn test_every_family_separates_blobs() {
        let (x, y) = blobs();
        for spec in all_specs() {
            let model = spec.fit(&x, &y).unwrap();
            assert_eq!(model.predict(&x).unwrap(), y, "{spec}");
        }
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let (x, _) = blobs();
        assert!(CandidateSpec::NearestCentroid.fit(&x, &[0, 1]).is_err());
    }

    #[test]
    fn test_rejects_nan_features() {
        let x = Array2::from_shape_vec((2, 1), vec![1.0, f64::NAN]).unwrap();
        assert!(CandidateSpec::NearestCentroid.fit(&x, &[0, 1]).is_err());
    }

    #[test]
    fn test_predict_checks_width() {
        let (x, y) = blobs();
        let model = CandidateSpec::NearestCentroid.fit(&x, &y).unwrap();
        let narrow = Array2::<f64>::zeros((1, 1));
        assert!(matches!(
            model.predict(&narrow),
            Err(AutoMlError::FeatureCount { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_argmax_prefers_first_on_tie() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), 1);
        assert_eq!(argmax(&[f64::NEG_INFINITY, f64::NEG_INFINITY]), 0);
    }
}
