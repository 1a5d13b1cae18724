//! Loading, merging and target encoding of a data directory.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use aml_common::{any_to_i64, any_to_string};
use aml_config::Config;
use polars::prelude::*;

use crate::discovery::candidate_files;
use crate::error::{IngestError, Result};
use crate::label::LabelEncoder;
use crate::table::read_csv_table;
use crate::validation::{ClassCount, Validation, check_class_counts};

/// What the loaded data will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPurpose {
    /// Label encoder changes are persisted.
    Training,
    /// Unseen labels are encoded in memory only.
    Evaluation,
}

/// Why a file did not contribute rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotFound,
    Parse(String),
    MissingTarget { columns: Vec<String> },
    Empty,
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "file not found"),
            Self::Parse(message) => write!(f, "unreadable: {message}"),
            Self::MissingTarget { columns } => {
                write!(f, "target column missing (header: {})", columns.join(", "))
            }
            Self::Empty => write!(f, "no data rows"),
            Self::SchemaMismatch { missing, unexpected } => write!(
                f,
                "columns differ from first file (missing: [{}], unexpected: [{}])",
                missing.join(", "),
                unexpected.join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Loaded { rows: usize, dropped_rows: usize },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub status: FileStatus,
}

/// Per-file outcomes of one load, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub files: Vec<FileOutcome>,
}

impl LoadReport {
    pub fn loaded_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Loaded { .. }))
            .count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&Path, &SkipReason)> {
        self.files.iter().filter_map(|f| match &f.status {
            FileStatus::Skipped(reason) => Some((f.path.as_path(), reason)),
            FileStatus::Loaded { .. } => None,
        })
    }

    /// Rows kept across all loaded files, before target filtering.
    pub fn total_rows(&self) -> usize {
        self.files
            .iter()
            .map(|f| match f.status {
                FileStatus::Loaded { rows, .. } => rows,
                FileStatus::Skipped(_) => 0,
            })
            .sum()
    }

    fn push(&mut self, path: &Path, status: FileStatus) {
        self.files.push(FileOutcome {
            path: path.to_path_buf(),
            status,
        });
    }
}

/// A loaded dataset with its target column ready for modelling.
///
/// After a successful load the target column is always `Int64`. When the raw
/// target was textual or fractional the codes come from [`LabelEncoder`].
#[derive(Debug, Clone)]
pub struct DataManager {
    target_column: String,
    class_percentage_validation: f64,
    data: Option<DataFrame>,
    label_encoder: Option<LabelEncoder>,
    report: LoadReport,
}

impl DataManager {
    /// Load every candidate file of `dir`.
    ///
    /// Only a missing directory is an error; unusable files are skipped and
    /// recorded in [`LoadReport`].
    pub fn load(dir: &Path, config: &Config, purpose: LoadPurpose) -> Result<Self> {
        let files = candidate_files(dir, config)?;
        tracing::info!(
            directory = %dir.display(),
            files = files.len(),
            "loading data directory"
        );
        Self::from_files(&files, config, purpose)
    }

    /// Load a single CSV file.
    pub fn load_file(path: &Path, config: &Config, purpose: LoadPurpose) -> Result<Self> {
        Self::from_files(&[path.to_path_buf()], config, purpose)
    }

    fn from_files(files: &[PathBuf], config: &Config, purpose: LoadPurpose) -> Result<Self> {
        let target = config.target_column.as_str();
        let mut report = LoadReport::default();
        let mut schema: Option<Vec<String>> = None;
        let mut frames: Vec<DataFrame> = Vec::new();

        for path in files {
            let table = match read_csv_table(path, config.delimiter_byte(), &config.encoding) {
                Ok(table) => table,
                Err(IngestError::FileNotFound { .. }) => {
                    tracing::warn!(path = %path.display(), "data file not found");
                    report.push(path, FileStatus::Skipped(SkipReason::NotFound));
                    continue;
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable file");
                    report.push(path, FileStatus::Skipped(SkipReason::Parse(error.to_string())));
                    continue;
                }
            };

            let columns = column_names(&table.frame);
            if !columns.iter().any(|c| c == target) {
                tracing::warn!(
                    path = %path.display(),
                    target,
                    header = %columns.join(", "),
                    "skipping file without target column"
                );
                report.push(path, FileStatus::Skipped(SkipReason::MissingTarget { columns }));
                continue;
            }

            if table.frame.height() == 0 {
                tracing::warn!(path = %path.display(), "skipping file without data rows");
                report.push(path, FileStatus::Skipped(SkipReason::Empty));
                continue;
            }

            if schema.is_none() {
                schema = Some(columns.clone());
            }
            let expected = schema.as_deref().unwrap_or_default();
            if let Some(reason) = schema_difference(expected, &columns) {
                tracing::warn!(path = %path.display(), reason = %reason, "skipping file");
                report.push(path, FileStatus::Skipped(reason));
                continue;
            }
            let frame = if expected == columns.as_slice() {
                table.frame
            } else {
                table.frame.select(expected.iter().map(String::as_str))?
            };

            tracing::debug!(
                path = %path.display(),
                rows = frame.height(),
                dropped_rows = table.dropped_rows,
                "loaded file"
            );
            report.push(
                path,
                FileStatus::Loaded {
                    rows: frame.height(),
                    dropped_rows: table.dropped_rows,
                },
            );
            frames.push(frame);
        }

        let mut manager = Self {
            target_column: target.to_string(),
            class_percentage_validation: config.class_percentage_validation,
            data: None,
            label_encoder: None,
            report,
        };

        if frames.is_empty() {
            tracing::warn!("no usable data files");
            return Ok(manager);
        }

        let merged = merge_frames(frames)?;
        let merged = drop_missing_targets(merged, target)?;
        let (merged, encoder) = encode_target(merged, config, purpose)?;

        tracing::info!(
            rows = merged.height(),
            columns = merged.width(),
            files = manager.report.loaded_count(),
            "data loaded"
        );

        manager.data = Some(merged);
        manager.label_encoder = encoder;
        Ok(manager)
    }

    pub fn data(&self) -> Option<&DataFrame> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<DataFrame> {
        self.data
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// All columns except the target, in frame order.
    pub fn feature_columns(&self) -> Vec<String> {
        self.data
            .as_ref()
            .map(|frame| {
                column_names(frame)
                    .into_iter()
                    .filter(|c| c != &self.target_column)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Distinct target codes, ascending.
    pub fn classes(&self) -> Vec<i64> {
        self.code_counts().into_keys().collect()
    }

    pub fn num_classes(&self) -> usize {
        self.code_counts().len()
    }

    /// Rows per class, labelled with the original class names when encoded.
    pub fn class_counts(&self) -> Vec<ClassCount> {
        self.code_counts()
            .into_iter()
            .map(|(code, count)| ClassCount {
                label: self
                    .label_encoder
                    .as_ref()
                    .and_then(|e| e.decode(code))
                    .map_or_else(|| code.to_string(), str::to_string),
                count,
            })
            .collect()
    }

    pub fn label_encoder(&self) -> Option<&LabelEncoder> {
        self.label_encoder.as_ref()
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Check the loaded data.
    ///
    /// Any purpose needs rows and at least two classes. With `for_train` every
    /// class must also reach the configured share of rows.
    pub fn validate(&self, for_train: bool) -> Validation {
        let threshold = for_train.then_some(self.class_percentage_validation);
        let result = check_class_counts(&self.class_counts(), threshold);
        if !result.is_valid() {
            tracing::warn!(reason = %result, for_train, "data failed validation");
        }
        result
    }

    fn code_counts(&self) -> BTreeMap<i64, usize> {
        let mut counts = BTreeMap::new();
        let Some(column) = self.data.as_ref().and_then(|f| f.column(&self.target_column).ok()) else {
            return counts;
        };
        let series = column.as_materialized_series().rechunk();
        for code in series.iter().filter_map(any_to_i64) {
            *counts.entry(code).or_insert(0usize) += 1;
        }
        counts
    }
}

fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect()
}

fn schema_difference(expected: &[String], found: &[String]) -> Option<SkipReason> {
    let expected_set: BTreeSet<&String> = expected.iter().collect();
    let found_set: BTreeSet<&String> = found.iter().collect();
    if expected_set == found_set {
        return None;
    }
    Some(SkipReason::SchemaMismatch {
        missing: expected_set.difference(&found_set).map(|s| (*s).clone()).collect(),
        unexpected: found_set.difference(&expected_set).map(|s| (*s).clone()).collect(),
    })
}

/// Common type for one column across files.
fn supertype(dtypes: &[&DataType]) -> DataType {
    if dtypes.iter().any(|d| matches!(d, DataType::String)) {
        DataType::String
    } else if dtypes.iter().any(|d| d.is_float()) {
        DataType::Float64
    } else {
        DataType::Int64
    }
}

/// Stack frames that share a column order, casting columns to a common type.
fn merge_frames(mut frames: Vec<DataFrame>) -> Result<DataFrame> {
    let Some(first) = frames.first() else {
        return Err(IngestError::DataFrame {
            message: "nothing to merge".to_string(),
        });
    };
    let names = column_names(first);

    for name in &names {
        let dtypes: Vec<&DataType> = frames
            .iter()
            .map(|f| f.column(name).map(Column::dtype))
            .collect::<PolarsResult<_>>()?;
        let target_type = supertype(&dtypes);
        if dtypes.iter().all(|d| **d == target_type) {
            continue;
        }
        tracing::debug!(column = %name, dtype = %target_type, "reconciling column type across files");
        for frame in &mut frames {
            let cast = frame.column(name)?.cast(&target_type)?;
            frame.with_column(cast)?;
        }
    }

    let mut iter = frames.into_iter();
    let mut merged = iter.next().unwrap_or_default();
    for frame in iter {
        merged.vstack_mut(&frame)?;
    }
    Ok(merged)
}

fn drop_missing_targets(frame: DataFrame, target: &str) -> Result<DataFrame> {
    let mask = frame.column(target)?.is_not_null();
    let filtered = frame.filter(&mask)?;
    let dropped = frame.height() - filtered.height();
    if dropped > 0 {
        tracing::warn!(rows = dropped, target, "dropped rows with missing target");
    }
    Ok(filtered)
}

/// Whether the target needs a label encoder.
fn needs_encoding(column: &Column) -> bool {
    match column.dtype() {
        dtype if dtype.is_integer() => false,
        dtype if dtype.is_float() => column
            .as_materialized_series()
            .rechunk()
            .iter()
            .any(|v| !matches!(v, AnyValue::Null) && any_to_i64(v).is_none()),
        _ => true,
    }
}

/// Replace the target with `Int64` codes.
fn encode_target(
    mut frame: DataFrame,
    config: &Config,
    purpose: LoadPurpose,
) -> Result<(DataFrame, Option<LabelEncoder>)> {
    let target = config.target_column.as_str();
    let column = frame.column(target)?.clone();

    if !needs_encoding(&column) {
        frame.with_column(column.cast(&DataType::Int64)?)?;
        return Ok((frame, None));
    }

    let labels: Vec<String> = column
        .as_materialized_series()
        .rechunk()
        .iter()
        .map(any_to_string)
        .collect();

    let path = config.label_encoder_path();
    let fresh = config.keep_training && purpose == LoadPurpose::Training;
    let mut encoder = if fresh {
        LabelEncoder::new()
    } else {
        LabelEncoder::load_or_default(&path)?
    };

    let changed = if encoder.is_fitted() {
        encoder.extend(labels.iter().map(String::as_str))
    } else {
        encoder.fit(labels.iter().map(String::as_str));
        true
    };

    if changed {
        match purpose {
            LoadPurpose::Training => encoder.save(&path)?,
            LoadPurpose::Evaluation => tracing::warn!(
                classes = encoder.classes().len(),
                "evaluation data has labels unseen in training"
            ),
        }
    }

    let codes = labels
        .iter()
        .map(|label| {
            encoder.encode(label).ok_or_else(|| IngestError::DataFrame {
                message: format!("label '{label}' missing from encoder"),
            })
        })
        .collect::<Result<Vec<i64>>>()?;

    frame.with_column(Column::new(target.into(), codes))?;
    tracing::debug!(classes = encoder.classes().len(), "encoded target labels");
    Ok((frame, Some(encoder)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> Config {
        Config {
            artifacts_directory: dir.path().join("artifacts"),
            ..Config::default()
        }
    }

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_load_merges_files_and_encodes_target() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir(&data).unwrap();
        write(&data, "a.csv", "f1,f2,target\n1,2,yes\n3,4,no\n");
        write(&data, "b.csv", "target,f2,f1\nno,5.5,6\n");

        let config = config_for(&dir);
        let manager = DataManager::load(&data, &config, LoadPurpose::Training).unwrap();
        let frame = manager.data().unwrap();

        assert_eq!(frame.height(), 3);
        assert_eq!(column_names(frame), vec!["f1", "f2", "target"]);
        assert_eq!(frame.column("f2").unwrap().dtype(), &DataType::Float64);
        assert_eq!(frame.column("target").unwrap().dtype(), &DataType::Int64);
        assert_eq!(manager.classes(), vec![0, 1]);
        assert_eq!(manager.feature_columns(), vec!["f1", "f2"]);
        assert!(config.label_encoder_path().is_file());

        let counts = manager.class_counts();
        assert_eq!(counts[0], ClassCount { label: "no".to_string(), count: 2 });
        assert_eq!(counts[1], ClassCount { label: "yes".to_string(), count: 1 });
    }

    #[test]
    fn test_file_without_target_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.csv", "f1,target\n1,0\n2,1\n");
        write(dir.path(), "b.csv", "f1,label\n1,0\n");

        let manager = DataManager::load(dir.path(), &config_for(&dir), LoadPurpose::Training).unwrap();
        assert_eq!(manager.data().unwrap().height(), 2);
        let skipped: Vec<_> = manager.report().skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert!(matches!(skipped[0].1, SkipReason::MissingTarget { .. }));
    }

    #[test]
    fn test_schema_mismatch_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.csv", "f1,target\n1,0\n2,1\n");
        write(dir.path(), "b.csv", "f1,f9,target\n1,2,0\n");

        let manager = DataManager::load(dir.path(), &config_for(&dir), LoadPurpose::Training).unwrap();
        assert_eq!(manager.data().unwrap().height(), 2);
        let skipped: Vec<_> = manager.report().skipped().collect();
        assert_eq!(
            skipped[0].1,
            &SkipReason::SchemaMismatch {
                missing: vec![],
                unexpected: vec!["f9".to_string()],
            }
        );
    }

    #[test]
    fn test_numeric_and_string_column_becomes_string() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.csv", "f1,target\n1,0\n2,1\n");
        write(dir.path(), "b.csv", "f1,target\nred,0\n");

        let manager = DataManager::load(dir.path(), &config_for(&dir), LoadPurpose::Training).unwrap();
        let frame = manager.data().unwrap();
        assert_eq!(frame.column("f1").unwrap().dtype(), &DataType::String);
        assert!(manager.label_encoder().is_none());
    }

    #[test]
    fn test_missing_target_rows_dropped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.csv", "f1,target\n1,0\n2,\n3,1\n");

        let manager = DataManager::load(dir.path(), &config_for(&dir), LoadPurpose::Training).unwrap();
        assert_eq!(manager.data().unwrap().height(), 2);
    }

    #[test]
    fn test_integral_float_target_not_encoded() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.csv", "f1,target\n1,0.0\n2,1.0\n");

        let manager = DataManager::load(dir.path(), &config_for(&dir), LoadPurpose::Training).unwrap();
        assert!(manager.label_encoder().is_none());
        assert_eq!(manager.classes(), vec![0, 1]);
    }

    #[test]
    fn test_fractional_target_is_encoded() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.csv", "f1,target\n1,0.5\n2,1.5\n3,0.5\n");

        let manager = DataManager::load(dir.path(), &config_for(&dir), LoadPurpose::Training).unwrap();
        let encoder = manager.label_encoder().unwrap();
        assert_eq!(encoder.classes(), &["0.5", "1.5"]);
    }

    #[test]
    fn test_encoder_reused_between_loads() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir);
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        std::fs::create_dir(&first).unwrap();
        std::fs::create_dir(&second).unwrap();
        write(&first, "a.csv", "f1,target\n1,b\n2,c\n");
        write(&second, "a.csv", "f1,target\n1,a\n2,c\n");

        DataManager::load(&first, &config, LoadPurpose::Training).unwrap();
        let manager = DataManager::load(&second, &config, LoadPurpose::Evaluation).unwrap();

        let encoder = manager.label_encoder().unwrap();
        assert_eq!(encoder.encode("b"), Some(0));
        assert_eq!(encoder.encode("c"), Some(1));
        assert_eq!(encoder.encode("a"), Some(2));

        // Evaluation does not persist new labels.
        let stored = LabelEncoder::load(&config.label_encoder_path()).unwrap().unwrap();
        assert_eq!(stored.classes(), &["b", "c"]);
    }

    #[test]
    fn test_single_file_mode_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            csv_name: Some("absent.csv".to_string()),
            ..config_for(&dir)
        };
        let manager = DataManager::load(dir.path(), &config, LoadPurpose::Training).unwrap();
        assert!(manager.data().is_none());
        assert_eq!(manager.validate(true), Validation::NoData);
        assert_eq!(
            manager.report().files[0].status,
            FileStatus::Skipped(SkipReason::NotFound)
        );
    }

    #[test]
    fn test_validate_imbalance_only_for_training() {
        let dir = TempDir::new().unwrap();
        let mut content = String::from("f1,target\n");
        for i in 0..99 {
            content.push_str(&format!("{i},0\n"));
        }
        content.push_str("99,1\n");
        write(dir.path(), "a.csv", &content);

        let config = Config {
            class_percentage_validation: 0.05,
            ..config_for(&dir)
        };
        let manager = DataManager::load(dir.path(), &config, LoadPurpose::Training).unwrap();
        assert!(matches!(manager.validate(true), Validation::ClassImbalance { .. }));
        assert!(manager.validate(false).is_valid());
    }

    #[test]
    fn test_validate_single_class() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.csv", "f1,target\n1,x\n2,x\n");
        let manager = DataManager::load(dir.path(), &config_for(&dir), LoadPurpose::Training).unwrap();
        assert_eq!(
            manager.validate(false),
            Validation::SingleClass {
                class: "x".to_string()
            }
        );
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = TempDir::new().unwrap();
        let result = DataManager::load(&dir.path().join("nope"), &config_for(&dir), LoadPurpose::Training);
        assert!(matches!(result, Err(IngestError::DirectoryNotFound { .. })));
    }
}
