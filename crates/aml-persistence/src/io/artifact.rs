//! Framed artifact save and load.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::{PersistenceError, Result};

/// Leading bytes of every artifact file.
pub const MAGIC_BYTES: [u8; 4] = *b"AML\x01";

/// Current frame schema version.
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

const HEADER_LEN: usize = 9;

/// What an artifact file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Fitted pipeline with its feature schema.
    Model,
    /// Target label encoder.
    LabelEncoder,
}

impl ArtifactKind {
    fn tag(self) -> u8 {
        match self {
            Self::Model => 1,
            Self::LabelEncoder => 2,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Model),
            2 => Some(Self::LabelEncoder),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::LabelEncoder => "label encoder",
        }
    }
}

/// Write a framed artifact.
///
/// Uses atomic write (temp file + rename) so a crash never leaves a
/// half-written artifact in place of a good one. Parent directories are
/// created as needed; an existing artifact is replaced.
pub fn write_artifact(path: &Path, kind: ArtifactKind, payload: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| PersistenceError::io("create directory", parent, e))?;
        }
    }

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&MAGIC_BYTES);
    bytes.extend_from_slice(&ARTIFACT_SCHEMA_VERSION.to_le_bytes());
    bytes.push(kind.tag());
    bytes.extend_from_slice(payload);

    let temp_path = path.with_extension("sav.tmp");

    let mut file = File::create(&temp_path).map_err(|e| PersistenceError::io("create", &temp_path, e))?;
    file.write_all(&bytes)
        .map_err(|e| PersistenceError::io("write", &temp_path, e))?;
    file.sync_all()
        .map_err(|e| PersistenceError::io("sync", &temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|e| PersistenceError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(
        path = %path.display(),
        kind = kind.label(),
        bytes = bytes.len(),
        "saved artifact"
    );
    Ok(())
}

/// Read a framed artifact and return its payload.
///
/// Rejects files with the wrong magic bytes, a newer schema version, or a
/// different artifact kind.
pub fn read_artifact(path: &Path, kind: ArtifactKind) -> Result<Vec<u8>> {
    let bytes = fs::read(path).map_err(|e| PersistenceError::io("read", path, e))?;

    if bytes.len() < HEADER_LEN {
        return Err(PersistenceError::InvalidFormat {
            path: path.to_path_buf(),
            reason: "file too small".to_string(),
        });
    }

    if bytes[0..4] != MAGIC_BYTES {
        return Err(PersistenceError::InvalidFormat {
            path: path.to_path_buf(),
            reason: "invalid magic bytes".to_string(),
        });
    }

    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version > ARTIFACT_SCHEMA_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: version,
            max_supported: ARTIFACT_SCHEMA_VERSION,
            path: path.to_path_buf(),
        });
    }

    let found = ArtifactKind::from_tag(bytes[8]).ok_or_else(|| PersistenceError::InvalidFormat {
        path: path.to_path_buf(),
        reason: format!("unknown artifact kind {}", bytes[8]),
    })?;
    if found != kind {
        return Err(PersistenceError::WrongKind {
            path: path.to_path_buf(),
            expected: kind.label(),
            found: found.label(),
        });
    }

    tracing::debug!(path = %path.display(), kind = kind.label(), "loaded artifact");
    Ok(bytes[HEADER_LEN..].to_vec())
}
