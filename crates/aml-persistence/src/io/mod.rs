//! File I/O operations.
//!
//! This module handles:
//! - Writing datasets as delimited text
//! - Content hashing for integrity checks
//! - Framed artifact save and load with atomic writes

mod artifact;
mod dataset;
mod hash;

pub use artifact::{ARTIFACT_SCHEMA_VERSION, ArtifactKind, MAGIC_BYTES, read_artifact, write_artifact};
pub use dataset::write_dataset;
pub use hash::{checksum, verify_checksum};
