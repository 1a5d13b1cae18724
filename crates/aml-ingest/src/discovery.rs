//! File discovery for data directories.

use std::path::{Path, PathBuf};

use aml_config::Config;

use crate::error::{IngestError, Result};

/// Lists all CSV files directly inside a directory.
///
/// Subdirectories are not descended into. The extension match is
/// case-insensitive. Returns files sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

/// Files the data manager should attempt to read from `dir`.
///
/// In single-file mode this is exactly `dir/<csv_name>`, whether or not it
/// exists (a missing file is reported by the reader). Otherwise it is every
/// CSV directly inside `dir`.
pub fn candidate_files(dir: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    match &config.csv_name {
        Some(name) => Ok(vec![dir.join(name)]),
        None => list_csv_files(dir),
    }
}
