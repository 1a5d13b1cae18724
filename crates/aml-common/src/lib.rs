//! Shared helpers for the AutoML skill crates.
//!
//! Cell-level parsing lives here so that the CSV reader, the feature encoder
//! and the predict-input parser all agree on what a missing value looks like
//! and how numbers are recognised.

mod missing;
mod values;

pub use missing::{MISSING_TOKENS, is_missing};
pub use values::{any_to_f64, any_to_i64, any_to_string, format_numeric, parse_f64, parse_i64};
