//! Persistence helpers for the AutoML skill.
//!
//! - **Dataset writing**: serialize a DataFrame to CSV and hand back a
//!   content checksum the hosting platform can verify.
//! - **Checksums**: streaming SHA-256 over a file's raw bytes.
//! - **Artifacts**: framed binary blobs (`model.sav`, `label_encoder.sav`)
//!   written atomically.
//!
//! # Artifact Format
//!
//! ```text
//! +------------------+
//! | Magic: "AML\x01" | 4 bytes - file identification
//! +------------------+
//! | Version: 1       | 4 bytes - u32 little-endian schema version
//! +------------------+
//! | Kind             | 1 byte  - model or label encoder
//! +------------------+
//! | Payload          | Variable - owned by the writing crate
//! +------------------+
//! ```
//!
//! The payload encoding belongs to the crate that owns the stored type; this
//! crate only frames, validates and moves bytes.

mod error;
mod io;

pub use error::{PersistenceError, Result};
pub use io::{
    ARTIFACT_SCHEMA_VERSION, ArtifactKind, MAGIC_BYTES, checksum, read_artifact, verify_checksum,
    write_artifact, write_dataset,
};
