//! Nearest class centroid.

use ndarray::Array2;
use rkyv::{Archive, Deserialize, Serialize};

use super::{argmax, distinct_classes};

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct NearestCentroid {
    classes: Vec<i64>,
    centroids: Vec<Vec<f64>>,
    n_features: usize,
}

impl NearestCentroid {
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(x: &Array2<f64>, y: &[i64]) -> Self {
        let n_features = x.ncols();
        let classes = distinct_classes(y);
        let centroids = classes
            .iter()
            .map(|&class| {
                let mut sum = vec![0.0; n_features];
                let mut count = 0usize;
                for (row, _) in x.rows().into_iter().zip(y).filter(|(_, c)| **c == class) {
                    count += 1;
                    for (s, v) in sum.iter_mut().zip(row) {
                        *s += v;
                    }
                }
                sum.into_iter().map(|s| s / count as f64).collect()
            })
            .collect();
        Self {
            classes,
            centroids,
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
                let closeness: Vec<f64> = self
                    .centroids
                    .iter()
                    .map(|centroid| {
                        -centroid
                            .iter()
                            .zip(row.iter())
                            .map(|(c, v)| (c - v).powi(2))
                            .sum::<f64>()
                    })
                    .collect();
                self.classes[argmax(&closeness)]
            })
            .collect()
    }
}
