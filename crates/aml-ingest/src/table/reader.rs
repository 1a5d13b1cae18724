//! CSV file reading with configurable delimiter and encoding.

use std::collections::BTreeSet;
use std::path::Path;

use encoding_rs::Encoding;
use polars::prelude::*;

use crate::error::{IngestError, Result};

use super::columns::{RawCell, build_column};

/// A parsed CSV file.
#[derive(Debug, Clone)]
pub struct CsvTable {
    /// Typed columns in header order.
    pub frame: DataFrame,
    /// Data rows discarded because their field count did not match the header.
    pub dropped_rows: usize,
}

/// Decode raw file bytes with the given encoding label.
///
/// A byte order mark is honoured and stripped. Bytes that are invalid in the
/// chosen encoding make the whole file unreadable.
fn decode(path: &Path, bytes: &[u8], encoding: &str) -> Result<String> {
    let encoding_impl =
        Encoding::for_label(encoding.trim().as_bytes()).ok_or_else(|| IngestError::UnsupportedEncoding {
            path: path.to_path_buf(),
            encoding: encoding.to_string(),
        })?;

    let (text, used, had_errors) = encoding_impl.decode(bytes);
    if had_errors {
        return Err(IngestError::Decode {
            path: path.to_path_buf(),
            encoding: used.name().to_string(),
        });
    }
    Ok(text.into_owned())
}

/// Normalize and check header names.
fn read_header(path: &Path, record: &::csv::StringRecord) -> Result<Vec<String>> {
    let columns: Vec<String> = record.iter().map(|h| h.trim().to_string()).collect();

    if columns.is_empty() || columns.iter().all(String::is_empty) {
        return Err(IngestError::NoHeaderDetected {
            path: path.to_path_buf(),
        });
    }

    let mut seen = BTreeSet::new();
    for (position, name) in columns.iter().enumerate() {
        if name.is_empty() {
            return Err(IngestError::EmptyColumnName {
                path: path.to_path_buf(),
                position,
            });
        }
        if !seen.insert(name.as_str()) {
            return Err(IngestError::DuplicateColumn {
                path: path.to_path_buf(),
                column: name.clone(),
            });
        }
    }

    Ok(columns)
}

/// Which fields of one raw record start with a quote character.
fn quoted_fields(record: &[u8], delimiter: u8) -> Vec<bool> {
    let mut flags = Vec::new();
    let mut at_field_start = true;
    let mut in_quotes = false;
    let skip = record
        .iter()
        .position(|b| *b != b'\n' && *b != b'\r')
        .unwrap_or(record.len());

    for &byte in &record[skip..] {
        if at_field_start {
            at_field_start = false;
            flags.push(byte == b'"');
            if byte == b'"' {
                in_quotes = true;
                continue;
            }
        }
        if byte == b'"' {
            // A doubled quote closes and reopens the quoted section.
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if byte == delimiter {
                at_field_start = true;
            } else if byte == b'\n' || byte == b'\r' {
                break;
            }
        }
    }
    if at_field_start {
        flags.push(false);
    }
    flags
}

/// Reads a CSV file into a Polars DataFrame.
///
/// The first row is the header. Rows whose field count differs from the
/// header are dropped and counted rather than failing the file. Column types
/// are inferred from the full column (integer, float, or string); quoted
/// fields are always text.
pub fn read_csv_table(path: &Path, delimiter: u8, encoding: &str) -> Result<CsvTable> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let text = decode(path, &bytes, encoding)?;

    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header_record = reader.headers().map_err(|e| IngestError::CsvParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let columns = read_header(path, header_record)?;

    let raw = text.as_bytes();
    let mut cells: Vec<Vec<RawCell>> = vec![Vec::new(); columns.len()];
    let mut dropped_rows = 0usize;
    let mut record = ::csv::StringRecord::new();
    let mut index = 0usize;

    loop {
        let start = usize::try_from(reader.position().byte()).unwrap_or(usize::MAX);
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(error) => {
                tracing::debug!(path = %path.display(), row = index + 1, %error, "dropping unreadable row");
                dropped_rows += 1;
                index += 1;
                continue;
            }
        }
        index += 1;

        if record.len() != columns.len() {
            tracing::debug!(
                path = %path.display(),
                row = index,
                expected = columns.len(),
                found = record.len(),
                "dropping row with wrong field count"
            );
            dropped_rows += 1;
            continue;
        }

        let end = usize::try_from(reader.position().byte()).unwrap_or(usize::MAX);
        let quoting = quoted_fields(raw.get(start..end).unwrap_or_default(), delimiter);
        for (position, (column, value)) in cells.iter_mut().zip(record.iter()).enumerate() {
            column.push(RawCell {
                text: value.to_string(),
                quoted: quoting.get(position).copied().unwrap_or(false),
            });
        }
    }

    if dropped_rows > 0 {
        tracing::warn!(
            path = %path.display(),
            dropped_rows,
            "skipped malformed rows"
        );
    }

    let frame_columns: Vec<Column> = columns
        .iter()
        .zip(cells.iter())
        .map(|(name, values)| build_column(name, values))
        .collect();
    let frame = DataFrame::new(frame_columns)?;

    Ok(CsvTable {
        frame,
        dropped_rows,
    })
}
