//! The persisted model: feature schema, fitted pipeline and search metadata.

use std::path::Path;

use aml_automl::FittedPipeline;
use aml_persistence::{ArtifactKind, read_artifact, write_artifact};
use rkyv::{Archive, Deserialize, Serialize};

use crate::error::{Result, SkillError};
use crate::features::{FeatureKind, FeatureSchema};

/// Everything needed to score new data, stored as `model.sav`.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub target_column: String,
    /// Original target labels by code, or `None` when the target was numeric.
    pub classes: Option<Vec<String>>,
    pub schema: FeatureSchema,
    pub pipeline: FittedPipeline,
    /// Name of the backend that found the pipeline.
    pub backend: String,
    /// Metric the pipeline was selected with.
    pub scoring: String,
    /// Mean cross-validated score at the last fit.
    pub cv_score: f64,
    pub trained_rows: u64,
    /// RFC 3339 timestamp of the last fit.
    pub created_at: String,
}

impl ModelArtifact {
    /// Label for a predicted code, when the target was label encoded.
    pub fn decode(&self, code: i64) -> Option<&str> {
        let index = usize::try_from(code).ok()?;
        self.classes.as_ref()?.get(index).map(String::as_str)
    }

    /// Human readable summary of the fitted pipeline, written next to `model.sav`.
    pub fn describe(&self) -> String {
        let mut lines = vec![
            format!("pipeline: MeanImputer -> {}", self.pipeline.spec()),
            format!("backend: {}", self.backend),
            format!("scoring: {}", self.scoring),
            format!("cv_score: {:.6}", self.cv_score),
            format!("trained_rows: {}", self.trained_rows),
            format!("created_at: {}", self.created_at),
            format!("target: {}", self.target_column),
        ];
        if let Some(classes) = &self.classes {
            lines.push(format!("classes: {}", classes.join(", ")));
        }
        lines.push("features:".to_string());
        for column in self.schema.columns() {
            let kind = match &column.kind {
                FeatureKind::Numeric => "numeric".to_string(),
                FeatureKind::Categorical { categories } => {
                    format!("categorical ({} categories)", categories.len())
                }
            };
            lines.push(format!("  {}: {kind}", column.name));
        }
        lines.join("\n") + "\n"
    }

    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, rkyv::rancor::Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self).map(|bytes| bytes.to_vec())
    }

    pub fn from_bytes(payload: &[u8]) -> std::result::Result<Self, rkyv::rancor::Error> {
        let mut aligned = rkyv::util::AlignedVec::<16>::new();
        aligned.extend_from_slice(payload);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
    }

    /// Write `model.sav`, replacing any previous model.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes().map_err(|e| SkillError::Artifact {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        write_artifact(path, ArtifactKind::Model, &bytes)?;
        tracing::info!(
            path = %path.display(),
            bytes = bytes.len(),
            pipeline = %self.pipeline.spec(),
            "saved model"
        );
        Ok(())
    }

    /// Read a saved model, or `None` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let payload = read_artifact(path, ArtifactKind::Model)?;
        let artifact = Self::from_bytes(&payload).map_err(|e| SkillError::Artifact {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::info!(
            path = %path.display(),
            backend = %artifact.backend,
            pipeline = %artifact.pipeline.spec(),
            created_at = %artifact.created_at,
            "loaded model"
        );
        Ok(Some(artifact))
    }
}
