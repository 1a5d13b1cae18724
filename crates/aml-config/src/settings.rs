//! The `Config` type and its layering rules.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// File name of the persisted model artifact inside the artifacts directory.
pub const MODEL_FILE: &str = "model.sav";

/// File name of the persisted label encoder inside the artifacts directory.
pub const LABEL_ENCODER_FILE: &str = "label_encoder.sav";

/// File name of the plain-text pipeline description written next to the model.
pub const PIPELINE_FILE: &str = "pipeline.txt";

/// Prefix accepted for upper-case environment variable spellings (`AML_TARGET_COLUMN`).
pub const ENV_PREFIX: &str = "AML_";

// =============================================================================
// ENUM SETTINGS
// =============================================================================

/// Metric used to rank candidates during search and to score evaluation data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    /// Fraction of correctly classified rows.
    #[default]
    Accuracy,
    /// Mean per-class recall.
    BalancedAccuracy,
    /// Unweighted mean of per-class F1.
    F1Macro,
}

impl Scoring {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accuracy => "accuracy",
            Self::BalancedAccuracy => "balanced_accuracy",
            Self::F1Macro => "f1_macro",
        }
    }
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scoring {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accuracy" => Ok(Self::Accuracy),
            "balanced_accuracy" => Ok(Self::BalancedAccuracy),
            "f1_macro" => Ok(Self::F1Macro),
            _ => Err(ConfigError::invalid(
                "scoring",
                s,
                "expected accuracy, balanced_accuracy or f1_macro",
            )),
        }
    }
}

/// Search strategy used by the built-in AutoML backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Time-budgeted random sampling of candidate configurations.
    #[default]
    RandomSearch,
    /// Generational search with selection and mutation.
    Evolutionary,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RandomSearch => "random-search",
            Self::Evolutionary => "evolutionary",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random-search" | "random_search" | "random" => Ok(Self::RandomSearch),
            "evolutionary" | "genetic" => Ok(Self::Evolutionary),
            _ => Err(ConfigError::invalid(
                "backend",
                s,
                "expected random-search or evolutionary",
            )),
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Process-wide settings, immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the column being classified.
    pub target_column: String,

    /// CSV field delimiter (single ASCII character).
    pub delimiter: char,

    /// Text encoding label understood by `encoding_rs` (e.g. `utf-8`, `latin1`).
    pub encoding: String,

    /// When set, only this file is read from a data directory.
    pub csv_name: Option<String>,

    /// Directory holding `model.sav` and `label_encoder.sav`.
    pub artifacts_directory: PathBuf,

    /// Minimum share of rows every class must have for training to proceed.
    pub class_percentage_validation: f64,

    /// Search time budget in minutes.
    pub train_time: f64,

    /// Metric used for search ranking and evaluation.
    pub scoring: Scoring,

    /// Rebuild the pipeline from scratch even when a trained model exists.
    pub keep_training: bool,

    /// Search strategy.
    pub backend: BackendKind,

    /// Number of cross-validation folds per candidate.
    pub cv_folds: usize,

    /// Generations for the evolutionary backend.
    pub generations: usize,

    /// Candidates per generation (evolutionary) or per batch (random search).
    pub population_size: usize,

    /// Worker threads for candidate evaluation; `-1` uses every core.
    pub n_jobs: i32,

    /// Seed for shuffling, splitting and search.
    pub random_state: u64,

    /// Share of rows held out by `process_data`.
    pub test_fraction: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_column: "target".to_string(),
            delimiter: ',',
            encoding: "utf-8".to_string(),
            csv_name: None,
            artifacts_directory: PathBuf::from("artifacts"),
            class_percentage_validation: 0.01,
            train_time: 2.0,
            scoring: Scoring::default(),
            keep_training: false,
            backend: BackendKind::default(),
            cv_folds: 5,
            generations: 5,
            population_size: 20,
            n_jobs: 1,
            random_state: 420,
            test_fraction: 0.2,
        }
    }
}

impl Config {
    /// Load settings from a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Defaults, then the optional file, then process environment; validated.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    ///
    /// Each setting is looked up by its lower-case name first (`target_column`)
    /// and then by the prefixed upper-case spelling (`AML_TARGET_COLUMN`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key).or_else(|| lookup(&format!("{ENV_PREFIX}{}", key.to_ascii_uppercase())))
        };

        if let Some(v) = get("target_column") {
            self.target_column = v;
        }
        if let Some(v) = get("delimiter") {
            self.delimiter = parse_delimiter(&v)?;
        }
        if let Some(v) = get("encoding") {
            self.encoding = v;
        }
        if let Some(v) = get("csv_name") {
            self.csv_name = if v.trim().is_empty() { None } else { Some(v) };
        }
        if let Some(v) = get("artifacts_directory") {
            self.artifacts_directory = PathBuf::from(v);
        }
        if let Some(v) = get("class_percentage_validation") {
            self.class_percentage_validation = parse_number("class_percentage_validation", &v)?;
        }
        if let Some(v) = get("train_time") {
            self.train_time = parse_number("train_time", &v)?;
        }
        if let Some(v) = get("scoring") {
            self.scoring = v.parse()?;
        }
        if let Some(v) = get("keep_training") {
            self.keep_training = parse_bool("keep_training", &v)?;
        }
        if let Some(v) = get("backend") {
            self.backend = v.parse()?;
        }
        if let Some(v) = get("cv_folds") {
            self.cv_folds = parse_number("cv_folds", &v)?;
        }
        if let Some(v) = get("generations") {
            self.generations = parse_number("generations", &v)?;
        }
        if let Some(v) = get("population_size") {
            self.population_size = parse_number("population_size", &v)?;
        }
        if let Some(v) = get("n_jobs") {
            self.n_jobs = parse_number("n_jobs", &v)?;
        }
        if let Some(v) = get("random_state") {
            self.random_state = parse_number("random_state", &v)?;
        }
        if let Some(v) = get("test_fraction") {
            self.test_fraction = parse_number("test_fraction", &v)?;
        }
        Ok(())
    }

    /// Check ranges and formats of every setting.
    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(ConfigError::invalid("target_column", "", "must not be empty"));
        }
        if !self.delimiter.is_ascii() || self.delimiter == '"' || self.delimiter == '\n' {
            return Err(ConfigError::invalid(
                "delimiter",
                self.delimiter,
                "must be a single ASCII character other than quote or newline",
            ));
        }
        if encoding_rs::Encoding::for_label(self.encoding.trim().as_bytes()).is_none() {
            return Err(ConfigError::invalid(
                "encoding",
                &self.encoding,
                "unknown encoding label",
            ));
        }
        if !(0.0..1.0).contains(&self.class_percentage_validation) {
            return Err(ConfigError::invalid(
                "class_percentage_validation",
                self.class_percentage_validation,
                "must be in [0, 1)",
            ));
        }
        if !(self.train_time > 0.0 && self.train_time.is_finite()) {
            return Err(ConfigError::invalid(
                "train_time",
                self.train_time,
                "must be a positive number of minutes",
            ));
        }
        if self.cv_folds < 2 {
            return Err(ConfigError::invalid("cv_folds", self.cv_folds, "must be at least 2"));
        }
        if self.generations == 0 {
            return Err(ConfigError::invalid("generations", 0, "must be at least 1"));
        }
        if self.population_size < 2 {
            return Err(ConfigError::invalid(
                "population_size",
                self.population_size,
                "must be at least 2",
            ));
        }
        if self.n_jobs == 0 || self.n_jobs < -1 {
            return Err(ConfigError::invalid(
                "n_jobs",
                self.n_jobs,
                "must be -1 or a positive thread count",
            ));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ConfigError::invalid(
                "test_fraction",
                self.test_fraction,
                "must be in (0, 1)",
            ));
        }
        Ok(())
    }

    /// Delimiter as the byte the CSV reader and writer expect.
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(u32::from(self.delimiter)).unwrap_or(b',')
    }

    /// True when a single configured file is read instead of a directory glob.
    pub fn is_single_file(&self) -> bool {
        self.csv_name.is_some()
    }

    pub fn model_path(&self) -> PathBuf {
        self.artifacts_directory.join(MODEL_FILE)
    }

    pub fn label_encoder_path(&self) -> PathBuf {
        self.artifacts_directory.join(LABEL_ENCODER_FILE)
    }

    pub fn pipeline_path(&self) -> PathBuf {
        self.artifacts_directory.join(PIPELINE_FILE)
    }

    /// Search budget as a duration.
    pub fn train_time_budget(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.train_time * 60.0)
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::invalid(key, value, e.to_string()))
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::invalid(key, value, "expected true or false")),
    }
}

fn parse_delimiter(value: &str) -> Result<char> {
    match value {
        "\\t" | "tab" => Ok('\t'),
        _ => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(ConfigError::invalid(
                    "delimiter",
                    value,
                    "must be exactly one character",
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.target_column, "target");
        assert_eq!(config.model_path(), PathBuf::from("artifacts/model.sav"));
        assert!(!config.is_single_file());
    }

    #[test]
    fn test_overrides_lower_and_prefixed_names() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[
                ("target_column", "click"),
                ("AML_SCORING", "balanced_accuracy"),
                ("keep_training", "True"),
                ("delimiter", ";"),
                ("AML_BACKEND", "evolutionary"),
            ]))
            .unwrap();

        assert_eq!(config.target_column, "click");
        assert_eq!(config.scoring, Scoring::BalancedAccuracy);
        assert!(config.keep_training);
        assert_eq!(config.delimiter_byte(), b';');
        assert_eq!(config.backend, BackendKind::Evolutionary);
    }

    #[test]
    fn test_lower_case_name_wins() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[("cv_folds", "3"), ("AML_CV_FOLDS", "7")]))
            .unwrap();
        assert_eq!(config.cv_folds, 3);
    }

    #[test]
    fn test_tab_delimiter() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[("delimiter", "\\t")])).unwrap();
        assert_eq!(config.delimiter, '\t');
    }

    #[test]
    fn test_bad_number_is_reported() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup(&[("train_time", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "train_time", .. }));
    }

    #[test]
    fn test_validate_rejects_ranges() {
        let config = Config {
            class_percentage_validation: 1.5,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            encoding: "klingon".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            n_jobs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skill.toml");
        std::fs::write(
            &path,
            "target_column = \"label\"\nscoring = \"f1_macro\"\nbackend = \"evolutionary\"\ncsv_name = \"data.csv\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.target_column, "label");
        assert_eq!(config.scoring, Scoring::F1Macro);
        assert_eq!(config.backend, BackendKind::Evolutionary);
        assert_eq!(config.csv_name.as_deref(), Some("data.csv"));
        assert_eq!(config.cv_folds, 5);
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "target_column = [").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
