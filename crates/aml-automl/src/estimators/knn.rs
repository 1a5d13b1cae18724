//! k-nearest neighbours on standardized features.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView1, Axis};
use rkyv::{Archive, Deserialize, Serialize};

use super::Weighting;
use crate::error::{AutoMlError, Result};

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Knn {
    k: u32,
    weighting: Weighting,
    means: Vec<f64>,
    scales: Vec<f64>,
    /// Standardized training rows, row-major.
    points: Vec<f64>,
    labels: Vec<i64>,
    n_features: usize,
}

impl Knn {
    pub fn fit(x: &Array2<f64>, y: &[i64], k: u32, weighting: Weighting) -> Result<Self> {
        let k_rows = usize::try_from(k).unwrap_or(usize::MAX);
        if k == 0 || k_rows > y.len() {
            return Err(AutoMlError::NotEnoughSamples {
                needed: k_rows.max(1),
                found: y.len(),
            });
        }

        let n_features = x.ncols();
        let means: Vec<f64> = x
            .mean_axis(Axis(0))
            .map(|m| m.to_vec())
            .unwrap_or_else(|| vec![0.0; n_features]);
        let scales: Vec<f64> = x
            .std_axis(Axis(0), 0.0)
            .iter()
            .map(|s| if *s > 0.0 { *s } else { 1.0 })
            .collect();

        let mut points = Vec::with_capacity(x.len());
        for row in x.rows() {
            points.extend(standardize(row, &means, &scales));
        }

        Ok(Self {
            k,
            weighting,
            means,
            scales,
            points,
            labels: y.to_vec(),
            n_features,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn predict(&self, x: &Array2<f64>) -> Vec<i64> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    fn predict_row<'a>(&'a self, row: ArrayView1<'a, f64>) -> i64 {
        let query: Vec<f64> = standardize(row, &self.means, &self.scales).collect();

        let mut distances: Vec<(f64, i64)> = self
            .points
            .chunks(self.n_features.max(1))
            .zip(&self.labels)
            .map(|(point, label)| {
                let d2: f64 = point.iter().zip(&query).map(|(a, b)| (a - b).powi(2)).sum();
                (d2.sqrt(), *label)
            })
            .collect();

        let k = usize::try_from(self.k).unwrap_or(1).min(distances.len());
        let by_distance = |a: &(f64, i64), b: &(f64, i64)| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal);
        if k < distances.len() {
            distances.select_nth_unstable_by(k - 1, by_distance);
        }

        let mut votes: BTreeMap<i64, f64> = BTreeMap::new();
        for (distance, label) in &distances[..k] {
            let weight = match self.weighting {
                Weighting::Uniform => 1.0,
                Weighting::Distance => 1.0 / distance.max(1e-12),
            };
            *votes.entry(*label).or_insert(0.0) += weight;
        }

        // Ties go to the smallest class code.
        votes
            .into_iter()
            .fold(None, |best: Option<(i64, f64)>, (label, weight)| match best {
                Some((_, w)) if w >= weight => best,
                _ => Some((label, weight)),
            })
            .map_or(0, |(label, _)| label)
    }
}

fn standardize<'a>(
    row: ArrayView1<'a, f64>,
    means: &'a [f64],
    scales: &'a [f64],
) -> impl Iterator<Item = f64> + 'a {
    row.into_iter()
        .zip(means.iter().zip(scales))
        .map(|(v, (m, s))| (v - m) / s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_majority_vote() {
        let x = array![[0.0], [0.1], [0.2], [10.0]];
        let y = [0, 0, 1, 1];
        let model = Knn::fit(&x, &y, 3, Weighting::Uniform).unwrap();
        assert_eq!(model.predict(&array![[0.05]]), vec![0]);
    }

    #[test]
    fn test_distance_weighting_prefers_exact_match() {
        let x = array![[0.0], [1.0], [1.1]];
        let y = [0, 1, 1];
        let model = Knn::fit(&x, &y, 3, Weighting::Distance).unwrap();
        assert_eq!(model.predict(&array![[0.0]]), vec![0]);
    }

    #[test]
    fn test_k_larger_than_data_fails() {
        let x = array![[0.0], [1.0]];
        assert!(Knn::fit(&x, &[0, 1], 5, Weighting::Uniform).is_err());
    }

    #[test]
    fn test_scale_invariance() {
        // Second feature spans a much larger range but carries no signal.
        let x = array![[0.0, 0.0], [0.0, 1000.0], [1.0, 0.0], [1.0, 1000.0]];
        let y = [0, 0, 1, 1];
        let model = Knn::fit(&x, &y, 1, Weighting::Uniform).unwrap();
        assert_eq!(model.predict(&array![[0.9, 400.0]]), vec![1]);
    }
}
