//! The train/evaluate/save lifecycle around one model artifact.

use std::path::{Path, PathBuf};

use aml_automl::{
    AutoMlBackend, FittedPipeline, SearchSettings, backend_for, cross_val_score, stratified_folds,
};
use aml_config::Config;
use aml_ingest::{
    DataManager, IngestError, LabelEncoder, LoadPurpose, LoadReport, Validation, stratified_split,
};
use aml_persistence::write_dataset;
use ndarray::Array2;
use polars::prelude::*;
use serde_json::{Map, Value};

use crate::artifact::ModelArtifact;
use crate::error::{Result, SkillError};
use crate::features::{FeatureSchema, target_codes};

/// Flat training file preferred by [`Skill::train`] when present.
pub const TRAIN_FILE: &str = "train.csv";
/// Flat evaluation file preferred by [`Skill::evaluate`] when present.
pub const EVALUATE_FILE: &str = "evaluate.csv";
/// Subdirectory written by [`Skill::process_data`] for the training split.
pub const TRAINING_DIR: &str = "training";
/// Subdirectory written by [`Skill::process_data`] for the evaluation split.
pub const TEST_DIR: &str = "test";

/// Whether a model is available.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelState {
    Untrained,
    Trained(Box<ModelArtifact>),
}

/// What a call to [`Skill::train`] did.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub backend: String,
    pub pipeline: String,
    pub cv_score: f64,
    pub rows: usize,
    pub features: usize,
    /// Candidates scored by the search; zero for a refit.
    pub evaluated: usize,
    /// True when an existing pipeline was refitted instead of searched.
    pub refit: bool,
    pub report: LoadReport,
}

/// Files written by [`Skill::process_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedData {
    pub train_path: PathBuf,
    pub train_checksum: String,
    pub train_rows: usize,
    pub test_path: PathBuf,
    pub test_checksum: String,
    pub test_rows: usize,
}

/// A trainable classifier bound to one configuration and one backend.
pub struct Skill {
    config: Config,
    backend: Box<dyn AutoMlBackend>,
    state: ModelState,
}

impl std::fmt::Debug for Skill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Skill")
            .field("backend", &self.backend.name())
            .field("trained", &self.is_trained())
            .field("artifacts_directory", &self.config.artifacts_directory)
            .finish_non_exhaustive()
    }
}

impl Skill {
    /// Open the skill, loading `model.sav` when present.
    pub fn open(config: Config, backend: Box<dyn AutoMlBackend>) -> Result<Self> {
        let state = match ModelArtifact::load(&config.model_path())? {
            Some(artifact) => ModelState::Trained(Box::new(artifact)),
            None => ModelState::Untrained,
        };
        tracing::info!(
            backend = backend.name(),
            trained = matches!(state, ModelState::Trained(_)),
            artifacts = %config.artifacts_directory.display(),
            "skill opened"
        );

        Ok(Self {
            config,
            backend,
            state,
        })
    }

    /// Open with the built-in backend named by the configuration.
    pub fn from_config(config: Config) -> Result<Self> {
        let backend = backend_for(config.backend);
        Self::open(config, backend)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.state, ModelState::Trained(_))
    }

    pub fn artifact(&self) -> Option<&ModelArtifact> {
        match &self.state {
            ModelState::Trained(artifact) => Some(artifact),
            ModelState::Untrained => None,
        }
    }

    fn trained(&self) -> Result<&ModelArtifact> {
        self.artifact().ok_or(SkillError::ModelNotTrained)
    }

    /// Load `dir/<flat>` when it exists, otherwise scan `dir`.
    fn load_data(&self, dir: &Path, flat: &str, purpose: LoadPurpose) -> Result<DataManager> {
        let flat_path = dir.join(flat);
        let result = if flat_path.is_file() {
            tracing::info!(path = %flat_path.display(), "using flat data file");
            DataManager::load_file(&flat_path, &self.config, purpose)
        } else {
            DataManager::load(dir, &self.config, purpose)
        };
        result.map_err(|e| match e {
            IngestError::DirectoryNotFound { path } => SkillError::DataUnavailable { path },
            other => other.into(),
        })
    }

    fn validated(dir: &Path, manager: DataManager, for_train: bool) -> Result<DataFrame> {
        match manager.validate(for_train) {
            Validation::Valid => {}
            Validation::NoData => {
                return Err(SkillError::DataUnavailable {
                    path: dir.to_path_buf(),
                });
            }
            Validation::SingleClass { class } => return Err(SkillError::InsufficientClasses { class }),
            imbalance @ Validation::ClassImbalance { .. } => {
                return Err(SkillError::ClassImbalance {
                    details: imbalance.to_string(),
                });
            }
        }
        manager.into_data().ok_or_else(|| SkillError::DataUnavailable {
            path: dir.to_path_buf(),
        })
    }

    /// Train on `dir`, searching a new pipeline or refitting the current one.
    ///
    /// A pipeline is searched when no model exists or `keep_training` is set.
    /// Otherwise the existing pipeline is refitted from scratch on the new
    /// rows with the same feature schema and hyperparameters.
    pub fn train(&mut self, dir: &Path) -> Result<TrainSummary> {
        let manager = self.load_data(dir, TRAIN_FILE, LoadPurpose::Training)?;
        let classes = manager.label_encoder().map(|e| e.classes().to_vec());
        let report = manager.report().clone();
        let frame = Self::validated(dir, manager, true)?;

        let target = self.config.target_column.as_str();
        let y = target_codes(&frame, target)?;
        let settings = SearchSettings::from_config(&self.config);
        let created_at = chrono::Utc::now().to_rfc3339();

        let (artifact, evaluated, refit) = match &self.state {
            ModelState::Trained(existing) if !self.config.keep_training => {
                let x = existing.schema.transform(&frame)?;
                let pipeline = existing.pipeline.refit(&x, &y)?;
                let cv_score = refit_cv_score(&pipeline, &x, &y, &settings);
                let artifact = ModelArtifact {
                    target_column: target.to_string(),
                    classes,
                    schema: existing.schema.clone(),
                    pipeline,
                    backend: existing.backend.clone(),
                    scoring: settings.scoring.to_string(),
                    cv_score,
                    trained_rows: y.len() as u64,
                    created_at,
                };
                (artifact, 0, true)
            }
            _ => {
                let schema = FeatureSchema::fit(&frame, target)?;
                let x = schema.transform(&frame)?;
                let outcome = self.backend.search(&x, &y, &settings)?;
                let artifact = ModelArtifact {
                    target_column: target.to_string(),
                    classes,
                    schema,
                    pipeline: outcome.pipeline,
                    backend: self.backend.name().to_string(),
                    scoring: settings.scoring.to_string(),
                    cv_score: outcome.cv_score,
                    trained_rows: y.len() as u64,
                    created_at,
                };
                (artifact, outcome.evaluated, false)
            }
        };

        let summary = TrainSummary {
            backend: artifact.backend.clone(),
            pipeline: artifact.pipeline.spec().to_string(),
            cv_score: artifact.cv_score,
            rows: y.len(),
            features: artifact.schema.len(),
            evaluated,
            refit,
            report,
        };
        tracing::info!(
            pipeline = %summary.pipeline,
            cv_score = summary.cv_score,
            rows = summary.rows,
            refit,
            "training complete"
        );

        self.state = ModelState::Trained(Box::new(artifact));
        Ok(summary)
    }

    /// Score the trained model on `dir` with the configured metric.
    pub fn evaluate(&self, dir: &Path) -> Result<f64> {
        let artifact = self.trained()?;
        let manager = self.load_data(dir, EVALUATE_FILE, LoadPurpose::Evaluation)?;
        let frame = Self::validated(dir, manager, false)?;

        let x = artifact.schema.transform(&frame)?;
        let y = target_codes(&frame, &self.config.target_column)?;
        let score = artifact.pipeline.score(&x, &y, self.config.scoring)?;

        tracing::info!(
            rows = y.len(),
            scoring = %self.config.scoring,
            score,
            "evaluation complete"
        );
        Ok(score)
    }

    /// Persist the trained model to `model.sav` and its description to
    /// `pipeline.txt`. Overwrites any previous files.
    pub fn save(&self) -> Result<PathBuf> {
        let artifact = self.trained()?;
        let path = self.config.model_path();
        artifact.save(&path)?;

        let description = self.config.pipeline_path();
        std::fs::write(&description, artifact.describe()).map_err(|source| SkillError::Export {
            path: description.clone(),
            source,
        })?;
        tracing::debug!(path = %description.display(), "wrote pipeline description");
        Ok(path)
    }

    /// Split `dir` into `training/train.csv` and `test/evaluate.csv`.
    ///
    /// The split is stratified by target class and seeded with
    /// `random_state`. Target values are written with their original labels.
    pub fn process_data(&self, dir: &Path) -> Result<ProcessedData> {
        let manager = DataManager::load(dir, &self.config, LoadPurpose::Training).map_err(|e| match e {
            IngestError::DirectoryNotFound { path } => SkillError::DataUnavailable { path },
            other => other.into(),
        })?;
        let encoder = manager.label_encoder().cloned();
        let frame = Self::validated(dir, manager, false)?;
        let target = self.config.target_column.as_str();

        let split = stratified_split(&frame, target, self.config.test_fraction, self.config.random_state)?;
        let train = decode_target(split.train, target, encoder.as_ref())?;
        let test = decode_target(split.test, target, encoder.as_ref())?;

        let delimiter = self.config.delimiter_byte();
        let train_dir = dir.join(TRAINING_DIR);
        let test_dir = dir.join(TEST_DIR);
        let train_checksum = write_dataset(&train, "train", &train_dir, delimiter)?;
        let test_checksum = write_dataset(&test, "evaluate", &test_dir, delimiter)?;

        let processed = ProcessedData {
            train_path: train_dir.join(TRAIN_FILE),
            train_checksum,
            train_rows: train.height(),
            test_path: test_dir.join(EVALUATE_FILE),
            test_checksum,
            test_rows: test.height(),
        };
        tracing::info!(
            train_rows = processed.train_rows,
            test_rows = processed.test_rows,
            train_checksum = %processed.train_checksum,
            test_checksum = %processed.test_checksum,
            "processed data"
        );
        Ok(processed)
    }

    /// Predict labels for a JSON object or an array of objects.
    ///
    /// Returns a single label for an object and an array for an array.
    /// Labels are decoded through the label encoder when one exists.
    pub fn predict(&self, input: &Value) -> Result<Value> {
        let artifact = self.trained()?;
        let (records, single) = match input {
            Value::Object(record) => (vec![record.clone()], true),
            Value::Array(items) => {
                let records = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        item.as_object().cloned().ok_or_else(|| SkillError::InvalidInput {
                            message: format!("element {i} is not an object"),
                        })
                    })
                    .collect::<Result<Vec<Map<String, Value>>>>()?;
                (records, false)
            }
            other => {
                return Err(SkillError::InvalidInput {
                    message: format!("expected an object or an array of objects, got {other}"),
                });
            }
        };

        if records.is_empty() {
            return Ok(Value::Array(Vec::new()));
        }

        let x = artifact.schema.transform_records(&records)?;
        let codes = artifact.pipeline.predict(&x)?;
        let mut labels: Vec<Value> = codes
            .into_iter()
            .map(|code| match artifact.decode(code) {
                Some(label) => Value::String(label.to_string()),
                None => Value::from(code),
            })
            .collect();
        tracing::debug!(records = labels.len(), "predicted");

        if single {
            Ok(labels.pop().unwrap_or(Value::Null))
        } else {
            Ok(Value::Array(labels))
        }
    }

    /// [`Skill::predict`] over a JSON string.
    pub fn predict_str(&self, input: &str) -> Result<String> {
        let value: Value = serde_json::from_str(input).map_err(|e| SkillError::InvalidInput {
            message: e.to_string(),
        })?;
        Ok(self.predict(&value)?.to_string())
    }

}

/// Mean CV score of a refitted pipeline, or NaN when the new data is too
/// small for the folds (the full refit has already succeeded).
fn refit_cv_score(pipeline: &FittedPipeline, x: &Array2<f64>, y: &[i64], settings: &SearchSettings) -> f64 {
    let score = stratified_folds(y, settings.cv_folds, settings.random_state)
        .and_then(|folds| cross_val_score(pipeline.spec(), x, y, &folds, settings.scoring));
    match score {
        Ok(score) => score,
        Err(error) => {
            tracing::warn!(%error, pipeline = %pipeline.spec(), "cross-validation of the refitted pipeline failed");
            f64::NAN
        }
    }
}

/// Replace target codes with their original labels.
fn decode_target(mut frame: DataFrame, target: &str, encoder: Option<&LabelEncoder>) -> Result<DataFrame> {
    let Some(encoder) = encoder else {
        return Ok(frame);
    };
    let labels: Vec<Option<String>> = target_codes(&frame, target)?
        .into_iter()
        .map(|code| encoder.decode(code).map(str::to_string))
        .collect();
    frame.with_column(Column::new(target.into(), labels))?;
    Ok(frame)
}
