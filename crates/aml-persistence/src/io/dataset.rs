//! Dataset writing.

use std::fs::{self, File};
use std::path::Path;

use polars::prelude::*;

use crate::error::{PersistenceError, Result};
use crate::io::hash::checksum;

/// Write `frame` to `<directory>/<name>.csv` and return the file's checksum.
///
/// The header row is always written, missing values become empty cells and
/// `delimiter` separates fields. Every non-numeric cell is quoted so text that
/// looks like a number or a missing-value token reads back as text. The directory is created when absent. The
/// returned digest is computed from the bytes on disk, so a caller can hand it
/// to whoever reads the file next.
pub fn write_dataset(frame: &DataFrame, name: &str, directory: &Path, delimiter: u8) -> Result<String> {
    fs::create_dir_all(directory)
        .map_err(|e| PersistenceError::io("create directory", directory, e))?;

    let path = directory.join(format!("{name}.csv"));
    let mut file = File::create(&path).map_err(|e| PersistenceError::io("create", &path, e))?;

    let mut frame = frame.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(delimiter)
        .with_quote_style(QuoteStyle::NonNumeric)
        .finish(&mut frame)
        .map_err(|e| PersistenceError::DatasetWrite {
            path: path.clone(),
            message: e.to_string(),
        })?;

    file.sync_all()
        .map_err(|e| PersistenceError::io("sync", &path, e))?;

    let digest = checksum(&path)?;
    tracing::debug!(
        path = %path.display(),
        rows = frame.height(),
        checksum = %digest,
        "wrote dataset"
    );
    Ok(digest)
}
