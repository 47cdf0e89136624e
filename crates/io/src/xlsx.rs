// Spreadsheet import (xls, xlsx, ods) via calamine

use std::path::Path;

use bbb_frame::{Column, Frame};
use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::IoError;

/// One imported cell before column types are decided.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

/// Import the first worksheet. Row 1 holds the column names.
///
/// Each column gets the narrowest type its non-empty cells fit:
/// `Int64` if all are whole numbers, `Float64` if all are numbers,
/// otherwise `Str`. Empty cells become nulls.
pub fn import_first_sheet(path: &Path) -> Result<Frame, IoError> {
    let sheet_err = |message: String| IoError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| sheet_err(format!("Failed to open Excel file: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| sheet_err("Excel file contains no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| sheet_err(format!("Failed to read sheet '{}': {}", sheet_name, e)))?;

    let mut rows = range.rows();
    let mut headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|c| c.to_string().trim().to_string()).collect(),
        None => return Err(sheet_err(format!("Sheet '{}' is empty", sheet_name))),
    };
    // The used range can extend past the last named column
    while headers.last().is_some_and(|h| h.is_empty()) {
        headers.pop();
    }

    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (col_idx, cell) in row.iter().enumerate().take(headers.len()) {
            cells[col_idx].push(convert(cell));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, col)| build_column(name, col))
        .collect();
    let frame = Frame::new(columns)?;

    debug!(
        path = %path.display(),
        sheet = %sheet_name,
        rows = frame.nrows(),
        "imported spreadsheet"
    );
    Ok(frame)
}

fn convert(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        // Date serials stay numeric, as in the sheet itself
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn build_column(name: String, cells: Vec<Cell>) -> Column {
    let all_numeric = cells.iter().all(|c| !matches!(c, Cell::Text(_)));
    if !all_numeric {
        let values = cells
            .into_iter()
            .map(|c| match c {
                Cell::Empty => None,
                Cell::Number(n) => Some(format_number(n)),
                Cell::Text(s) => Some(s),
            })
            .collect();
        return Column::str(name, values);
    }

    let numbers: Vec<Option<f64>> = cells
        .into_iter()
        .map(|c| match c {
            Cell::Number(n) => Some(n),
            _ => None,
        })
        .collect();

    let integral = numbers
        .iter()
        .flatten()
        .all(|n| n.fract() == 0.0 && n.abs() < 9.0e15);
    if integral {
        Column::int64(name, numbers.into_iter().map(|n| n.map(|n| n as i64)).collect())
    } else {
        Column::float64(name, numbers)
    }
}

/// Format nicely: integers without decimals
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
