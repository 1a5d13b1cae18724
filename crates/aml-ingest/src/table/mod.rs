//! CSV reading utilities.

mod columns;
mod reader;

pub use reader::{CsvTable, read_csv_table};
