//! Terminal tables for command results.

use std::path::Path;

use aml_core::{ProcessedData, TrainSummary};
use aml_ingest::{FileStatus, LoadReport};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).fg(Color::Cyan).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

/// Per-file load outcome, one row per discovered file.
pub fn print_load_report(report: &LoadReport) {
    if report.files.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("File"), header_cell("Status"), header_cell("Rows")]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for outcome in &report.files {
        match &outcome.status {
            FileStatus::Loaded { rows, dropped_rows } => {
                let status = if *dropped_rows > 0 {
                    Cell::new(format!("loaded ({dropped_rows} rows dropped)")).fg(Color::Yellow)
                } else {
                    Cell::new("loaded").fg(Color::Green)
                };
                table.add_row(vec![Cell::new(file_name(&outcome.path)), status, Cell::new(rows)]);
            }
            FileStatus::Skipped(reason) => {
                table.add_row(vec![
                    Cell::new(file_name(&outcome.path)),
                    Cell::new(format!("skipped: {reason}")).fg(Color::Red),
                    dim_cell("-"),
                ]);
            }
        }
    }
    println!("{table}");
}

pub fn print_train_summary(summary: &TrainSummary) {
    print_load_report(&summary.report);
    let mut table = Table::new();
    table.set_header(vec![header_cell("Training"), header_cell("")]);
    apply_table_style(&mut table);
    let mode = if summary.refit { "refit" } else { "search" };
    let evaluated = if summary.refit {
        dim_cell("-")
    } else {
        Cell::new(summary.evaluated)
    };
    table.add_row(vec![Cell::new("Backend"), Cell::new(&summary.backend)]);
    table.add_row(vec![Cell::new("Mode"), Cell::new(mode)]);
    table.add_row(vec![Cell::new("Pipeline"), Cell::new(&summary.pipeline)]);
    table.add_row(vec![Cell::new("Candidates"), evaluated]);
    table.add_row(vec![Cell::new("Rows"), Cell::new(summary.rows)]);
    table.add_row(vec![Cell::new("Features"), Cell::new(summary.features)]);
    table.add_row(vec![
        Cell::new("CV score"),
        Cell::new(format!("{:.4}", summary.cv_score)).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

pub fn print_processed(processed: &ProcessedData) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Split"),
        header_cell("File"),
        header_cell("Rows"),
        header_cell("SHA-256"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    table.add_row(vec![
        Cell::new("train"),
        Cell::new(processed.train_path.display()),
        Cell::new(processed.train_rows),
        dim_cell(&processed.train_checksum),
    ]);
    table.add_row(vec![
        Cell::new("evaluate"),
        Cell::new(processed.test_path.display()),
        Cell::new(processed.test_rows),
        dim_cell(&processed.test_checksum),
    ]);
    println!("{table}");
}

pub fn print_score(scoring: &str, score: f64) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Score")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![
        Cell::new(scoring),
        Cell::new(format!("{score:.4}")).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}
