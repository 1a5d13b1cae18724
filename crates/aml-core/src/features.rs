//! Feature encoding from data frames and JSON records into a numeric matrix.

use aml_common::{any_to_f64, any_to_string, format_numeric, parse_f64};
use ndarray::Array2;
use polars::prelude::*;
use rkyv::{Archive, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SkillError};

/// How one feature column becomes a number.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Used as is; missing cells become NaN.
    Numeric,
    /// Replaced by the index of the value in `categories` (sorted).
    /// Values not seen during training become NaN.
    Categorical { categories: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureColumn {
    fn encode_text(&self, text: &str) -> f64 {
        match &self.kind {
            FeatureKind::Numeric => parse_f64(text).unwrap_or(f64::NAN),
            FeatureKind::Categorical { categories } => categories
                .binary_search_by(|c| c.as_str().cmp(text))
                .map_or(f64::NAN, |idx| {
                    #[allow(clippy::cast_precision_loss)]
                    let code = idx as f64;
                    code
                }),
        }
    }

    fn encode_any(&self, value: AnyValue<'_>) -> f64 {
        if matches!(value, AnyValue::Null) {
            return f64::NAN;
        }
        match &self.kind {
            FeatureKind::Numeric => any_to_f64(value).unwrap_or(f64::NAN),
            FeatureKind::Categorical { .. } => self.encode_text(&any_to_string(value)),
        }
    }

    fn encode_json(&self, value: Option<&Value>) -> Result<f64> {
        Ok(match value {
            None | Some(Value::Null) => f64::NAN,
            Some(Value::Number(n)) => match &self.kind {
                FeatureKind::Numeric => n.as_f64().unwrap_or(f64::NAN),
                FeatureKind::Categorical { .. } => {
                    let text = n.as_f64().map_or_else(|| n.to_string(), format_numeric);
                    self.encode_text(&text)
                }
            },
            Some(Value::String(s)) => self.encode_text(s),
            Some(Value::Bool(b)) => match &self.kind {
                FeatureKind::Numeric => {
                    if *b {
                        1.0
                    } else {
                        0.0
                    }
                }
                FeatureKind::Categorical { .. } => self.encode_text(&b.to_string()),
            },
            Some(other) => {
                return Err(SkillError::InvalidInput {
                    message: format!("feature '{}' has a nested value: {other}", self.name),
                });
            }
        })
    }
}

/// The ordered feature columns a model was trained on.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<FeatureColumn>,
}

fn is_numeric(dtype: &DataType) -> bool {
    dtype.is_integer() || dtype.is_float() || matches!(dtype, DataType::Boolean)
}

impl FeatureSchema {
    /// Learn the schema from every non-target column of `frame`.
    pub fn fit(frame: &DataFrame, target: &str) -> Result<Self> {
        let mut columns = Vec::new();
        for column in frame.get_columns() {
            let name = column.name().to_string();
            if name == target {
                continue;
            }
            let kind = if is_numeric(column.dtype()) {
                FeatureKind::Numeric
            } else {
                let mut categories: Vec<String> = column
                    .as_materialized_series()
                    .rechunk()
                    .iter()
                    .filter(|v| !matches!(v, AnyValue::Null))
                    .map(any_to_string)
                    .collect();
                categories.sort_unstable();
                categories.dedup();
                FeatureKind::Categorical { categories }
            };
            columns.push(FeatureColumn { name, kind });
        }

        if columns.is_empty() {
            return Err(SkillError::SchemaMismatch {
                message: format!("no feature columns besides target '{target}'"),
            });
        }

        tracing::debug!(
            features = columns.len(),
            categorical = columns
                .iter()
                .filter(|c| matches!(c.kind, FeatureKind::Categorical { .. }))
                .count(),
            "fitted feature schema"
        );
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Encode `frame` in schema order. Extra columns are ignored.
    pub fn transform(&self, frame: &DataFrame) -> Result<Array2<f64>> {
        let missing: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| frame.column(&c.name).is_err())
            .map(|c| c.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(SkillError::SchemaMismatch {
                message: format!("missing feature columns: {}", missing.join(", ")),
            });
        }

        let mut matrix = Array2::from_elem((frame.height(), self.columns.len()), f64::NAN);
        for (j, feature) in self.columns.iter().enumerate() {
            let series = frame.column(&feature.name)?.as_materialized_series().rechunk();
            for (i, value) in series.iter().enumerate() {
                matrix[[i, j]] = feature.encode_any(value);
            }
        }
        Ok(matrix)
    }

    /// Encode JSON records keyed by feature name.
    ///
    /// Absent keys count as missing values. A record sharing no key with the
    /// schema is rejected.
    pub fn transform_records(&self, records: &[Map<String, Value>]) -> Result<Array2<f64>> {
        let mut matrix = Array2::from_elem((records.len(), self.columns.len()), f64::NAN);
        for (i, record) in records.iter().enumerate() {
            if !self.columns.iter().any(|c| record.contains_key(&c.name)) {
                return Err(SkillError::SchemaMismatch {
                    message: format!(
                        "record {i} has none of the features: {}",
                        self.names().join(", ")
                    ),
                });
            }
            for (j, feature) in self.columns.iter().enumerate() {
                matrix[[i, j]] = feature.encode_json(record.get(&feature.name))?;
            }
        }
        Ok(matrix)
    }
}

/// Integer class codes of the target column.
pub fn target_codes(frame: &DataFrame, target: &str) -> Result<Vec<i64>> {
    let column = frame.column(target)?.cast(&DataType::Int64)?;
    column
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, code)| {
            code.ok_or_else(|| SkillError::SchemaMismatch {
                message: format!("target '{target}' is missing at row {row}"),
            })
        })
        .collect()
}
