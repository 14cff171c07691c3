//! Output formats for a batch table: CSV, JSON and a plain-text table.
//!
//! All three carry the same rows in the same column order. Cells are
//! written as-is; nothing is coerced or reformatted.

use crate::error::ExtractError;
use crate::schema::{output_columns, OutputRow, COLUMN_COUNT};
use std::path::Path;
use tracing::info;

/// Serialise rows as UTF-8 CSV with a header row of column names.
///
/// Every line has exactly [`COLUMN_COUNT`] fields. Cells containing a
/// delimiter, quote or line break are quoted by the `csv` writer.
pub fn to_csv(rows: &[OutputRow]) -> Result<Vec<u8>, ExtractError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(output_columns())?;
    for row in rows {
        writer.write_record(row.cells())?;
    }
    writer
        .into_inner()
        .map_err(|e| ExtractError::Csv(csv::Error::from(e.into_error())))
}

/// Write rows as CSV to `path`, replacing any existing file.
///
/// The file is written to a sibling temp file first and renamed into place,
/// so a failed write never leaves a half-written table behind.
pub async fn write_csv(path: impl AsRef<Path>, rows: &[OutputRow]) -> Result<(), ExtractError> {
    let path = path.as_ref();
    let bytes = to_csv(rows)?;

    let write_failed = |e: std::io::Error| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    tokio::fs::write(&tmp_path, &bytes).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Serialise rows as a JSON array of objects keyed by column name.
pub fn to_json(rows: &[OutputRow]) -> Result<String, ExtractError> {
    serde_json::to_string_pretty(rows)
        .map_err(|e| ExtractError::Internal(format!("Failed to serialise JSON: {e}")))
}

/// Render rows as a left-aligned text table for terminal display.
pub fn render_table(rows: &[OutputRow]) -> String {
    let headers: Vec<&str> = output_columns().collect();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(display_width(cell));
        }
    }

    let mut out = String::new();
    push_line(&mut out, headers.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, rule.iter().map(String::as_str), &widths);
    for row in rows {
        let cells: Vec<String> = row.cells().iter().map(|c| single_line(c)).collect();
        push_line(&mut out, cells.iter().map(String::as_str), &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    debug_assert_eq!(widths.len(), COLUMN_COUNT);
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    out.push_str(line.join(" | ").trim_end());
    out.push('\n');
}

fn single_line(cell: &str) -> String {
    cell.replace(['\r', '\n'], " ")
}

fn display_width(cell: &str) -> usize {
    single_line(cell).chars().count()
}
