//! Column-mean imputation of missing feature values.

use ndarray::{Array2, Axis};
use rkyv::{Archive, Deserialize, Serialize};

use crate::error::{AutoMlError, Result};

/// Replaces NaN cells with the training mean of their column.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct MeanImputer {
    means: Vec<f64>,
}

impl MeanImputer {
    /// Learn column means, ignoring NaN. A column with no values gets 0.
    pub fn fit(x: &Array2<f64>) -> Self {
        let means = x
            .axis_iter(Axis(1))
            .map(|column| {
                let (sum, count) = column
                    .iter()
                    .filter(|v| !v.is_nan())
                    .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
                if count == 0 {
                    0.0
                } else {
                    #[allow(clippy::cast_precision_loss)]
                    let n = count as f64;
                    sum / n
                }
            })
            .collect();
        Self { means }
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.means.len() {
            return Err(AutoMlError::FeatureCount {
                expected: self.means.len(),
                found: x.ncols(),
            });
        }
        let mut out = x.clone();
        for (mut column, mean) in out.axis_iter_mut(Axis(1)).zip(&self.means) {
            column.mapv_inplace(|v| if v.is_nan() { *mean } else { v });
        }
        Ok(out)
    }
}
