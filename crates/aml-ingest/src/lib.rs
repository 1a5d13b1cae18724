//! Tabular data ingestion for the AutoML skill.
//!
//! This crate turns a directory of CSV files into a validated, label-encoded
//! Polars DataFrame ready for training or evaluation.
//!
//! # Features
//!
//! - **Discovery**: single configured file, or every `*.csv` directly inside a directory
//! - **CSV Loading**: configurable delimiter and text encoding, malformed rows dropped
//! - **Merging**: files with the same column set are stacked, others are skipped and reported
//! - **Label Encoding**: non-numeric targets are encoded with a persisted encoder
//! - **Validation**: class-count and class-balance checks before training
//! - **Splitting**: seeded stratified train/evaluation split
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use aml_config::Config;
//! use aml_ingest::{DataManager, LoadPurpose};
//!
//! let config = Config::default();
//! let manager = DataManager::load(Path::new("data"), &config, LoadPurpose::Training)?;
//! if manager.validate(true).is_valid() {
//!     let frame = manager.data().unwrap();
//! }
//! ```

mod discovery;
mod error;
mod label;
mod manager;
mod split;
mod table;
mod validation;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use table::{CsvTable, read_csv_table};

// === File Discovery ===
pub use discovery::{candidate_files, list_csv_files};

// === Label Encoding ===
pub use label::LabelEncoder;

// === Data Manager ===
pub use manager::{DataManager, FileOutcome, FileStatus, LoadPurpose, LoadReport, SkipReason};

// === Splitting ===
pub use split::{Split, stratified_split};

// === Validation ===
pub use validation::{ClassCount, Validation, check_class_counts};
