//! Classification metrics.

use std::collections::{BTreeMap, BTreeSet};

use aml_config::Scoring;

/// Score predictions with the configured metric. Higher is better.
pub fn score(scoring: Scoring, y_true: &[i64], y_pred: &[i64]) -> f64 {
    match scoring {
        Scoring::Accuracy => accuracy(y_true, y_pred),
        Scoring::BalancedAccuracy => balanced_accuracy(y_true, y_pred),
        Scoring::F1Macro => f1_macro(y_true, y_pred),
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Fraction of exact matches.
pub fn accuracy(y_true: &[i64], y_pred: &[i64]) -> f64 {
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    ratio(correct, y_true.len())
}

/// Mean recall over the classes present in `y_true`.
pub fn balanced_accuracy(y_true: &[i64], y_pred: &[i64]) -> f64 {
    let mut per_class: BTreeMap<i64, (usize, usize)> = BTreeMap::new();
    for (t, p) in y_true.iter().zip(y_pred) {
        let entry = per_class.entry(*t).or_default();
        entry.1 += 1;
        if t == p {
            entry.0 += 1;
        }
    }
    if per_class.is_empty() {
        return 0.0;
    }
    let total: f64 = per_class.values().map(|&(hit, n)| ratio(hit, n)).sum();
    #[allow(clippy::cast_precision_loss)]
    let classes = per_class.len() as f64;
    total / classes
}

/// Unweighted mean F1 over every label seen in either input.
pub fn f1_macro(y_true: &[i64], y_pred: &[i64]) -> f64 {
    let labels: BTreeSet<i64> = y_true.iter().chain(y_pred).copied().collect();
    if labels.is_empty() {
        return 0.0;
    }
    let total: f64 = labels
        .iter()
        .map(|&label| {
            let mut tp = 0usize;
            let mut fp = 0usize;
            let mut fn_ = 0usize;
            for (t, p) in y_true.iter().zip(y_pred) {
                match (*t == label, *p == label) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }
            ratio(2 * tp, 2 * tp + fp + fn_)
        })
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let n = labels.len() as f64;
    total / n
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_accuracy() {
        assert!((accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]) - 0.75).abs() < EPS);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_balanced_accuracy_weights_classes_equally() {
        // class 0 recall 1.0 (8/8), class 1 recall 0.5 (1/2)
        let y_true = [0, 0, 0, 0, 0, 0, 0, 0, 1, 1];
        let y_pred = [0, 0, 0, 0, 0, 0, 0, 0, 1, 0];
        assert!((balanced_accuracy(&y_true, &y_pred) - 0.75).abs() < EPS);
        assert!((accuracy(&y_true, &y_pred) - 0.9).abs() < EPS);
    }

    #[test]
    fn test_f1_macro() {
        // class 0: tp=1 fp=1 fn=1 -> 0.5 ; class 1: tp=1 fp=1 fn=1 -> 0.5
        let y_true = [0, 0, 1, 1];
        let y_pred = [0, 1, 0, 1];
        assert!((f1_macro(&y_true, &y_pred) - 0.5).abs() < EPS);
        assert!((f1_macro(&[0, 1], &[0, 1]) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_score_dispatch() {
        let y = [0, 1, 2];
        for scoring in [Scoring::Accuracy, Scoring::BalancedAccuracy, Scoring::F1Macro] {
            assert!((score(scoring, &y, &y) - 1.0).abs() < EPS);
        }
    }
}
