//! Target label encoding with on-disk caching.

use std::collections::BTreeSet;
use std::path::Path;

use aml_persistence::{ArtifactKind, read_artifact, write_artifact};
use rkyv::{Archive, Deserialize, Serialize};

use crate::error::{IngestError, Result};

/// Maps raw target labels to integer codes.
///
/// The code of a label is its position in `classes`. Codes are only ever
/// appended, so a label keeps its code for as long as the encoder is reused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an encoder from an explicit class list.
    pub fn from_classes(classes: Vec<String>) -> Self {
        Self { classes }
    }

    /// Known labels in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn is_fitted(&self) -> bool {
        !self.classes.is_empty()
    }

    /// Replace the mapping with the sorted distinct labels.
    pub fn fit<'a, I>(&mut self, labels: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = labels.into_iter().collect();
        self.classes = distinct.into_iter().map(str::to_string).collect();
    }

    /// Append labels not seen before, keeping existing codes.
    ///
    /// New labels are added in sorted order. Returns true when the mapping grew.
    pub fn extend<'a, I>(&mut self, labels: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: BTreeSet<&str> = self.classes.iter().map(String::as_str).collect();
        let unseen: BTreeSet<&str> = labels.into_iter().filter(|l| !known.contains(l)).collect();
        if unseen.is_empty() {
            return false;
        }
        let unseen: Vec<String> = unseen.into_iter().map(str::to_string).collect();
        self.classes.extend(unseen);
        true
    }

    pub fn encode(&self, label: &str) -> Option<i64> {
        self.classes
            .iter()
            .position(|c| c == label)
            .and_then(|idx| i64::try_from(idx).ok())
    }

    pub fn decode(&self, code: i64) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.classes.get(idx))
            .map(String::as_str)
    }

    /// Load a persisted encoder, or `None` when no file exists yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let payload = read_artifact(path, ArtifactKind::LabelEncoder)?;

        let mut aligned = rkyv::util::AlignedVec::<16>::new();
        aligned.extend_from_slice(&payload);
        let encoder = rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned).map_err(|e| {
            IngestError::LabelEncoder {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        tracing::info!(
            path = %path.display(),
            classes = encoder.classes.len(),
            "loaded label encoder"
        );
        Ok(Some(encoder))
    }

    /// Load the persisted encoder or start from an empty one.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        Ok(Self::load(path)?.unwrap_or_default())
    }

    /// Persist the encoder, replacing any previous file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self).map_err(|e| IngestError::LabelEncoder {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        write_artifact(path, ArtifactKind::LabelEncoder, &bytes)?;
        Ok(())
    }
}
