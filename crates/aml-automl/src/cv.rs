//! Stratified k-fold cross-validation.

use std::collections::BTreeMap;

use ndarray::{Array2, Axis};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use aml_config::Scoring;

use crate::error::{AutoMlError, Result};
use crate::metrics::score;
use crate::pipeline::FittedPipeline;
use crate::estimators::CandidateSpec;

/// One train/test partition of row indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Build `n_splits` stratified folds.
///
/// Rows of each class are shuffled with a seeded generator and dealt to the
/// folds round-robin, so every fold gets a near-equal share of each class.
/// The number of folds is reduced to the row count when there are fewer rows.
pub fn stratified_folds(y: &[i64], n_splits: usize, seed: u64) -> Result<Vec<Fold>> {
    if y.len() < 2 {
        return Err(AutoMlError::NotEnoughSamples {
            needed: 2,
            found: y.len(),
        });
    }
    let n_splits = n_splits.clamp(2, y.len());

    let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, class) in y.iter().enumerate() {
        class_indices.entry(*class).or_default().push(idx);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
    let mut offset = 0usize;
    for indices in class_indices.values_mut() {
        indices.shuffle(&mut rng);
        for (i, &idx) in indices.iter().enumerate() {
            folds[(offset + i) % n_splits].push(idx);
        }
        // The next class starts at the fold after the last one dealt.
        offset = (offset + indices.len()) % n_splits;
    }

    Ok((0..n_splits)
        .map(|fold_idx| {
            let mut test = folds[fold_idx].clone();
            test.sort_unstable();
            let mut train: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, f)| f.iter().copied())
                .collect();
            train.sort_unstable();
            Fold { train, test }
        })
        .filter(|fold| !fold.test.is_empty() && !fold.train.is_empty())
        .collect())
}

/// Mean held-out score of `spec` across `folds`.
pub fn cross_val_score(
    spec: &CandidateSpec,
    x: &Array2<f64>,
    y: &[i64],
    folds: &[Fold],
    scoring: Scoring,
) -> Result<f64> {
    if folds.is_empty() {
        return Err(AutoMlError::InvalidInput("no cross-validation folds".to_string()));
    }
    let mut total = 0.0;
    for fold in folds {
        let x_train = x.select(Axis(0), &fold.train);
        let y_train: Vec<i64> = fold.train.iter().map(|&i| y[i]).collect();
        let x_test = x.select(Axis(0), &fold.test);
        let y_test: Vec<i64> = fold.test.iter().map(|&i| y[i]).collect();

        let pipeline = FittedPipeline::fit(spec.clone(), &x_train, &y_train)?;
        let predictions = pipeline.predict(&x_test)?;
        total += score(scoring, &y_test, &predictions);
    }
    #[allow(clippy::cast_precision_loss)]
    let n = folds.len() as f64;
    Ok(total / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_folds_cover_every_row_once() {
        let y: Vec<i64> = (0..23).map(|i| i % 3).collect();
        let folds = stratified_folds(&y, 5, 420).unwrap();
        assert_eq!(folds.len(), 5);

        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.test.iter().copied()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..23).collect::<Vec<_>>());

        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), 23);
        }
    }

    #[test]
    fn test_fold_count_reduced_for_tiny_data() {
        let folds = stratified_folds(&[0, 1, 0], 5, 1).unwrap();
        assert_eq!(folds.len(), 3);
    }

    #[test]
    fn test_too_few_rows() {
        assert!(stratified_folds(&[0], 5, 1).is_err());
    }

    proptest! {
        #[test]
        fn prop_folds_are_stratified(
            sizes in proptest::collection::vec(5usize..60, 2..4),
            k in 2usize..6,
            seed in any::<u64>(),
        ) {
            let y: Vec<i64> = sizes
                .iter()
                .enumerate()
                .flat_map(|(class, &n)| std::iter::repeat_n(class as i64, n))
                .collect();
            let folds = stratified_folds(&y, k, seed).unwrap();
            prop_assert_eq!(folds.len(), k);
            for fold in &folds {
                for (class, &n) in sizes.iter().enumerate() {
                    let in_test = fold.test.iter().filter(|&&i| y[i] == class as i64).count();
                    prop_assert!(in_test == n / k || in_test == n / k + 1);
                }
            }
        }
    }
}
