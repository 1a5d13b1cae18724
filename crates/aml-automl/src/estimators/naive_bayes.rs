//! Gaussian naive Bayes.

use std::f64::consts::PI;

use ndarray::Array2;
use rkyv::{Archive, Deserialize, Serialize};

use super::{argmax, distinct_classes};

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct GaussianNb {
    classes: Vec<i64>,
    log_priors: Vec<f64>,
    means: Vec<Vec<f64>>,
    variances: Vec<Vec<f64>>,
    n_features: usize,
}

impl GaussianNb {
    /// Per-class feature means and variances.
    ///
    /// `var_smoothing` times the largest feature variance is added to every
    /// variance so constant features stay usable.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(x: &Array2<f64>, y: &[i64], var_smoothing: f64) -> Self {
        let n_features = x.ncols();
        let classes = distinct_classes(y);

        let max_variance = x
            .columns()
            .into_iter()
            .map(|c| c.var(0.0))
            .fold(0.0f64, f64::max);
        let epsilon = (var_smoothing * max_variance).max(f64::MIN_POSITIVE);

        let mut log_priors = Vec::with_capacity(classes.len());
        let mut means = Vec::with_capacity(classes.len());
        let mut variances = Vec::with_capacity(classes.len());

        for &class in &classes {
            // Welford's single-pass mean and variance.
            let mut mean = vec![0.0; n_features];
            let mut m2 = vec![0.0; n_features];
            let mut count = 0usize;
            for (row, _) in x.rows().into_iter().zip(y).filter(|(_, c)| **c == class) {
                count += 1;
                for (j, &value) in row.iter().enumerate() {
                    let delta = value - mean[j];
                    mean[j] += delta / count as f64;
                    m2[j] += delta * (value - mean[j]);
                }
            }
            let n = count as f64;
            variances.push(m2.iter().map(|v| v / n + epsilon).collect());
            means.push(mean);
            log_priors.push((n / y.len() as f64).ln());
        }

        Self {
            classes,
            log_priors,
            means,
            variances,
            n_features,
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn predict(&self, x: &Array2<f64>) -> Vec<i64> {
        x.rows()
            .into_iter()
            .map(|row| {
                let scores: Vec<f64> = (0..self.classes.len())
                    .map(|c| {
                        let likelihood: f64 = row
                            .iter()
                            .zip(&self.means[c])
                            .zip(&self.variances[c])
                            .map(|((v, mean), var)| -0.5 * (2.0 * PI * var).ln() - (v - mean).powi(2) / (2.0 * var))
                            .sum();
                        self.log_priors[c] + likelihood
                    })
                    .collect();
                self.classes[argmax(&scores)]
            })
            .collect()
    }
}
