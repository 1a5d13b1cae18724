//! Seeded stratified train/evaluation split.

use std::collections::BTreeMap;

use aml_common::any_to_string;
use polars::prelude::*;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::error::{IngestError, Result};

/// Two disjoint partitions of one dataset.
#[derive(Debug, Clone)]
pub struct Split {
    pub train: DataFrame,
    pub test: DataFrame,
}

/// Number of rows of a class of size `n` that go to the evaluation side.
fn test_share(n: usize, fraction: f64) -> usize {
    if n < 2 {
        return 0;
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let wanted = (n as f64 * fraction).round() as usize;
    wanted.clamp(1, n - 1)
}

/// Split `frame` so each target class keeps its proportion on both sides.
///
/// Within each class rows are shuffled with a generator seeded from `seed`,
/// then `round(n * fraction)` of them (at least one, never all) go to the
/// test side. Classes with a single row stay on the training side. Row order
/// within each side follows the original frame.
pub fn stratified_split(frame: &DataFrame, target: &str, fraction: f64, seed: u64) -> Result<Split> {
    let column = frame
        .column(target)
        .map_err(|_| IngestError::ColumnNotFound {
            column: target.to_string(),
        })?;

    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    let series = column.as_materialized_series().rechunk();
    for (row, value) in series.iter().enumerate() {
        groups.entry(any_to_string(value)).or_default().push(row);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train_rows = Vec::with_capacity(frame.height());
    let mut test_rows = Vec::new();

    for (class, mut rows) in groups {
        let n_test = test_share(rows.len(), fraction);
        if rows.len() < 2 {
            tracing::warn!(class = %class, "class has a single row; keeping it in the training split");
        }
        rows.shuffle(&mut rng);
        let (test, train) = rows.split_at(n_test);
        test_rows.extend_from_slice(test);
        train_rows.extend_from_slice(train);
    }

    train_rows.sort_unstable();
    test_rows.sort_unstable();

    let train = take_rows(frame, &train_rows)?;
    let test = take_rows(frame, &test_rows)?;

    tracing::info!(
        train_rows = train.height(),
        test_rows = test.height(),
        fraction,
        seed,
        "stratified split"
    );

    Ok(Split { train, test })
}

fn take_rows(frame: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let indices: Vec<IdxSize> = rows
        .iter()
        .map(|&r| IdxSize::try_from(r))
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| IngestError::DataFrame {
            message: format!("row index out of range: {e}"),
        })?;
    let indices = IdxCa::from_vec("idx".into(), indices);
    Ok(frame.take(&indices)?)
}
