//! Column type inference for raw CSV cells.

use aml_common::{is_missing, parse_f64, parse_i64};
use polars::prelude::*;

/// One field as it appeared in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawCell {
    pub text: String,
    /// The field was enclosed in quotes.
    pub quoted: bool,
}

impl RawCell {
    /// A quoted cell is always text, even when it reads like a number or a
    /// missing-value token.
    fn value(&self) -> Option<&str> {
        if !self.quoted && is_missing(&self.text) {
            None
        } else {
            Some(self.text.as_str())
        }
    }

    fn numeric_text(&self) -> Option<&str> {
        (!self.quoted && has_numeric_shape(&self.text)).then_some(self.text.as_str())
    }
}

/// Rejects texts that parse as numbers but would not be written back the
/// same way: a leading `+` or leading zeros (`007`, `-01.5`).
fn has_numeric_shape(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.starts_with('+') {
        return false;
    }
    let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let integer_part = unsigned.split(['.', 'e', 'E']).next().unwrap_or_default();
    !(integer_part.len() > 1 && integer_part.starts_with('0'))
}

/// Build a typed column from raw cells.
///
/// A column is `Int64` when every non-missing cell is an unquoted integer,
/// `Float64` when every non-missing cell is an unquoted number, and `String`
/// otherwise. A column with no values at all is `Float64` of nulls.
pub(crate) fn build_column(name: &str, cells: &[RawCell]) -> Column {
    let present: Vec<Option<&RawCell>> = cells.iter().map(|c| c.value().map(|_| c)).collect();
    let numeric: Option<Vec<&str>> = present.iter().flatten().map(|c| c.numeric_text()).collect();

    if let Some(numeric) = numeric {
        let any_present = !numeric.is_empty();
        if any_present && numeric.iter().all(|v| parse_i64(v).is_some()) {
            let values: Vec<Option<i64>> = present
                .iter()
                .map(|c| c.and_then(|c| parse_i64(&c.text)))
                .collect();
            return Column::new(name.into(), values);
        }
        if numeric.iter().all(|v| parse_f64(v).is_some()) {
            let values: Vec<Option<f64>> = present
                .iter()
                .map(|c| c.and_then(|c| parse_f64(&c.text)))
                .collect();
            return Column::new(name.into(), values);
        }
    }

    let values: Vec<Option<&str>> = present.iter().map(|c| c.map(|c| c.text.as_str())).collect();
    Column::new(name.into(), values)
}
