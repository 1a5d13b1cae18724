//! Class-count checks applied before training.

use std::fmt;

/// Number of rows carrying one target class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCount {
    /// Class label as it appeared in the data (decoded when encoded).
    pub label: String,
    pub count: usize,
}

/// Result of checking a dataset's target distribution.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// Usable for the requested purpose.
    Valid,
    /// No rows were loaded.
    NoData,
    /// Every row has the same class.
    SingleClass { class: String },
    /// At least one class falls below the configured share of rows.
    ClassImbalance {
        min_count: f64,
        offenders: Vec<ClassCount>,
    },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::NoData => write!(f, "no data"),
            Self::SingleClass { class } => write!(f, "only one class present ('{class}')"),
            Self::ClassImbalance { min_count, offenders } => {
                let names: Vec<String> = offenders
                    .iter()
                    .map(|c| format!("'{}' ({} rows)", c.label, c.count))
                    .collect();
                write!(
                    f,
                    "classes below the minimum of {min_count:.2} rows: {}",
                    names.join(", ")
                )
            }
        }
    }
}

/// Check a class distribution.
///
/// Fewer than two classes is never valid. When `threshold` is given, every
/// class must have at least `threshold * total` rows.
pub fn check_class_counts(counts: &[ClassCount], threshold: Option<f64>) -> Validation {
    let total: usize = counts.iter().map(|c| c.count).sum();
    if total == 0 {
        return Validation::NoData;
    }

    let present: Vec<&ClassCount> = counts.iter().filter(|c| c.count > 0).collect();
    if present.len() < 2 {
        let class = present.first().map(|c| c.label.clone()).unwrap_or_default();
        return Validation::SingleClass { class };
    }

    let Some(threshold) = threshold else {
        return Validation::Valid;
    };

    #[allow(clippy::cast_precision_loss)]
    let min_count = threshold * total as f64;
    #[allow(clippy::cast_precision_loss)]
    let offenders: Vec<ClassCount> = present
        .into_iter()
        .filter(|c| (c.count as f64) < min_count)
        .cloned()
        .collect();

    if offenders.is_empty() {
        Validation::Valid
    } else {
        Validation::ClassImbalance { min_count, offenders }
    }
}
