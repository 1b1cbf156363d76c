//! CSV export and console rendering for frames and indicator tables.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tifft_indicators::{Cell, IndicatorTable};
use tracing::debug;

use crate::frame::PriceFrame;

/// Header of the date index column in exported and rendered tables.
pub const INDEX_HEADER: &str = "DATE";

const DATE_FORMAT: &str = "%Y-%m-%d";
const CONSOLE_PRECISION: usize = 6;

/// Writes `frame` to `path`, replacing any existing file.
pub fn write_frame_csv(path: &Path, frame: &PriceFrame) -> Result<()> {
    let headers = frame.column_names();
    let rows = (0..frame.len()).map(|row| {
        frame
            .columns()
            .iter()
            .map(|series| Cell::Float(series.values[row]))
            .collect::<Vec<_>>()
    });
    write_csv(path, frame.index(), &headers, rows)
}

/// Writes an indicator table indexed by `index` to `path`, replacing any existing file.
pub fn write_table_csv(path: &Path, index: &[NaiveDate], table: &IndicatorTable) -> Result<()> {
    if index.len() != table.len() {
        bail!(
            "index has {} rows but the table has {}",
            index.len(),
            table.len()
        );
    }
    write_csv(path, index, &table.column_names(), table.rows())
}

fn write_csv(
    path: &Path,
    index: &[NaiveDate],
    headers: &[&str],
    rows: impl Iterator<Item = Vec<Cell>>,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(std::iter::once(INDEX_HEADER).chain(headers.iter().copied()))?;
    for (date, cells) in index.iter().zip(rows) {
        let mut record = Vec::with_capacity(cells.len() + 1);
        record.push(date.format(DATE_FORMAT).to_string());
        record.extend(cells.iter().map(csv_cell));
        writer.write_record(&record)?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), rows = index.len(), "wrote csv file");
    Ok(())
}

fn csv_cell(cell: &Cell) -> String {
    if cell.is_missing() {
        String::new()
    } else {
        cell.to_string()
    }
}

/// Renders `frame` as a right-aligned text table.
///
/// With `max_rows` set and exceeded, only the first and last rows are shown around a `...` line.
/// `Some(0)` behaves like `None`.
pub fn render_frame(frame: &PriceFrame, max_rows: Option<usize>) -> String {
    let headers = frame.column_names();
    render(frame.index(), &headers, max_rows, |row| {
        frame
            .columns()
            .iter()
            .map(|series| Cell::Float(series.values[row]))
            .collect()
    })
}

/// Renders an indicator table next to its date index. See [`render_frame`] for `max_rows`.
pub fn render_table(index: &[NaiveDate], table: &IndicatorTable, max_rows: Option<usize>) -> String {
    let headers = table.column_names();
    let len = index.len().min(table.len());
    render(&index[..len], &headers, max_rows, |row| {
        table
            .columns()
            .iter()
            .filter_map(|column| table.value_at(row, &column.name))
            .collect()
    })
}

fn render(
    index: &[NaiveDate],
    headers: &[&str],
    max_rows: Option<usize>,
    cells_at: impl Fn(usize) -> Vec<Cell>,
) -> String {
    let (head, tail) = visible_rows(index.len(), max_rows);
    let format_row = |row: usize| -> Vec<String> {
        std::iter::once(index[row].format(DATE_FORMAT).to_string())
            .chain(
                cells_at(row)
                    .iter()
                    .map(|cell| format!("{cell:.CONSOLE_PRECISION$}")),
            )
            .collect()
    };
    let head_rows: Vec<Vec<String>> = head.map(format_row).collect();
    let tail_rows: Vec<Vec<String>> = tail.clone().map(format_row).collect();

    let header: Vec<String> = std::iter::once(INDEX_HEADER)
        .chain(headers.iter().copied())
        .map(str::to_string)
        .collect();
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in head_rows.iter().chain(&tail_rows) {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &header, &widths);
    for row in &head_rows {
        push_line(&mut out, row, &widths);
    }
    if !tail.is_empty() {
        out.push_str("...\n");
        for row in &tail_rows {
            push_line(&mut out, row, &widths);
        }
        let _ = writeln!(
            out,
            "\n[{} rows x {} columns]",
            index.len(),
            headers.len()
        );
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (col, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if col == 0 {
            let _ = write!(line, "{cell:<width$}");
        } else {
            let _ = write!(line, "  {cell:>width$}");
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Splits `len` rows into the head and tail ranges to display.
fn visible_rows(
    len: usize,
    max_rows: Option<usize>,
) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
    match max_rows {
        Some(max) if max > 0 && len > max => {
            let tail = max / 2;
            let head = max - tail;
            (0..head, len - tail..len)
        }
        _ => (0..len, len..len),
    }
}
