//! The fitted `impute -> estimator` pipeline.

use ndarray::Array2;
use rkyv::{Archive, Deserialize, Serialize};

use aml_config::Scoring;

use crate::error::Result;
use crate::estimators::{CandidateSpec, Estimator};
use crate::imputer::MeanImputer;
use crate::metrics::score;

/// A trained pipeline: mean imputation followed by one estimator.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct FittedPipeline {
    imputer: MeanImputer,
    spec: CandidateSpec,
    estimator: Estimator,
}

impl FittedPipeline {
    /// Fit the imputer and the estimator on `x`, which may contain NaN.
    pub fn fit(spec: CandidateSpec, x: &Array2<f64>, y: &[i64]) -> Result<Self> {
        let imputer = MeanImputer::fit(x);
        let filled = imputer.transform(x)?;
        let estimator = spec.fit(&filled, y)?;
        Ok(Self {
            imputer,
            spec,
            estimator,
        })
    }

    /// Fit again from scratch with the same hyperparameters.
    pub fn refit(&self, x: &Array2<f64>, y: &[i64]) -> Result<Self> {
        tracing::info!(pipeline = %self.spec, rows = y.len(), "refitting pipeline");
        Self::fit(self.spec.clone(), x, y)
    }

    pub fn spec(&self) -> &CandidateSpec {
        &self.spec
    }

    pub fn imputer(&self) -> &MeanImputer {
        &self.imputer
    }

    pub fn n_features(&self) -> usize {
        self.estimator.n_features()
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<i64>> {
        let filled = self.imputer.transform(x)?;
        self.estimator.predict(&filled)
    }

    pub fn score(&self, x: &Array2<f64>, y: &[i64], scoring: Scoring) -> Result<f64> {
        let predictions = self.predict(x)?;
        Ok(score(scoring, y, &predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimators::testing::blobs;

    #[test]
    fn test_pipeline_imputes_before_predicting() {
        let (x, y) = blobs();
        let pipeline = FittedPipeline::fit(CandidateSpec::NearestCentroid, &x, &y).unwrap();

        let query = Array2::from_shape_vec((1, 2), vec![f64::NAN, 6.0]).unwrap();
        assert_eq!(pipeline.predict(&query).unwrap().len(), 1);
        assert!((pipeline.score(&x, &y, Scoring::Accuracy).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_refit_keeps_spec() {
        let (x, y) = blobs();
        let spec = CandidateSpec::DecisionTree {
            max_depth: 3,
            min_samples_leaf: 2,
        };
        let pipeline = FittedPipeline::fit(spec.clone(), &x, &y).unwrap();
        let refitted = pipeline.refit(&x, &y).unwrap();
        assert_eq!(refitted.spec(), &spec);
        assert_eq!(refitted, pipeline);
    }
}
