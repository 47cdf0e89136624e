// Native table artifact format using SQLite

use std::path::Path;

use bbb_frame::{Column, ColumnData, DType, Frame};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OpenFlags};
use tracing::debug;

use crate::error::IoError;
use crate::NATIVE_FORMAT_VERSION;

const SCHEMA: &str = r#"
CREATE TABLE meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE columns (
    position INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    dtype TEXT NOT NULL           -- int64, int32, float64, string, category, date
);

CREATE TABLE categories (
    position INTEGER NOT NULL,
    code INTEGER NOT NULL,
    label TEXT NOT NULL,
    PRIMARY KEY (position, code)
);

CREATE TABLE cells (
    row INTEGER NOT NULL,
    position INTEGER NOT NULL,
    value_int INTEGER,            -- integers, category codes
    value_real REAL,              -- finite floats
    value_text TEXT,              -- strings, ISO dates, non-finite floats
    PRIMARY KEY (row, position)
);
"#;

/// Write `frame` to `path`, replacing any existing file.
///
/// Null cells are not stored. Rows are inserted in order, so the same frame
/// always produces the same file.
pub fn save(frame: &Frame, path: &Path) -> Result<(), IoError> {
    // Delete existing file if present (SQLite will create fresh)
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| IoError::file(path, e))?;
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| IoError::file(parent, e))?;
    }

    let mut conn = Connection::open(path).map_err(|e| IoError::file(path, e))?;
    conn.execute_batch(SCHEMA)?;

    let tx = conn.transaction()?;
    {
        let mut meta = tx.prepare("INSERT INTO meta (key, value) VALUES (?1, ?2)")?;
        meta.execute(params!["format_version", NATIVE_FORMAT_VERSION.to_string()])?;
        meta.execute(params!["rows", frame.nrows().to_string()])?;
        if let Some(ref desc) = frame.description {
            meta.execute(params!["description", desc])?;
        }

        let mut col_stmt =
            tx.prepare("INSERT INTO columns (position, name, dtype) VALUES (?1, ?2, ?3)")?;
        let mut cat_stmt =
            tx.prepare("INSERT INTO categories (position, code, label) VALUES (?1, ?2, ?3)")?;
        let mut cell_stmt = tx.prepare(
            "INSERT INTO cells (row, position, value_int, value_real, value_text) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        for (pos, col) in frame.columns().iter().enumerate() {
            let pos = pos as i64;
            col_stmt.execute(params![pos, col.name, col.dtype().as_str()])?;

            if let ColumnData::Categorical { categories, .. } = &col.data {
                for (code, label) in categories.iter().enumerate() {
                    cat_stmt.execute(params![pos, code as i64, label])?;
                }
            }

            for row in 0..frame.nrows() {
                let (int, real, text) = match encode_cell(&col.data, row) {
                    Some(cell) => cell,
                    None => continue,
                };
                cell_stmt.execute(params![row as i64, pos, int, real, text])?;
            }
        }
    }
    tx.commit()?;

    debug!(path = %path.display(), rows = frame.nrows(), cols = frame.ncols(), "saved table artifact");
    Ok(())
}

type Encoded = (Option<i64>, Option<f64>, Option<String>);

fn encode_cell(data: &ColumnData, row: usize) -> Option<Encoded> {
    match data {
        ColumnData::Int64(v) => v[row].map(|n| (Some(n), None, None)),
        ColumnData::Int32(v) => v[row].map(|n| (Some(n as i64), None, None)),
        ColumnData::Float64(v) => v[row].map(|x| {
            if x.is_finite() {
                (None, Some(x), None)
            } else {
                // SQLite stores NaN as NULL
                (None, None, Some(x.to_string()))
            }
        }),
        ColumnData::Str(v) => v[row].clone().map(|s| (None, None, Some(s))),
        ColumnData::Categorical { codes, .. } => codes[row].map(|c| (Some(c as i64), None, None)),
        ColumnData::Date(v) => v[row].map(|d| (None, None, Some(d.format("%Y-%m-%d").to_string()))),
    }
}

/// Read a table artifact written by [`save`].
pub fn load(path: &Path) -> Result<Frame, IoError> {
    if !path.is_file() {
        return Err(IoError::file(path, "table artifact not found"));
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| IoError::file(path, e))?;

    let meta = |key: &str| -> Result<Option<String>, IoError> {
        let mut stmt = conn.prepare("SELECT value FROM meta WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    };

    let version: u32 = meta("format_version")
        .map_err(|e| IoError::Native(format!("not a table artifact: {e}")))?
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| IoError::Native("missing format_version".into()))?;
    if version > NATIVE_FORMAT_VERSION {
        return Err(IoError::Native(format!(
            "format version {version} is newer than supported version {NATIVE_FORMAT_VERSION}"
        )));
    }

    let nrows: usize = meta("rows")?
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| IoError::Native("missing row count".into()))?;
    let description = meta("description")?;

    let mut stmt = conn.prepare("SELECT position, name, dtype FROM columns ORDER BY position")?;
    let specs = stmt
        .query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut columns = Vec::with_capacity(specs.len());
    for (pos, name, dtype) in specs {
        let dtype = DType::parse(&dtype)
            .ok_or_else(|| IoError::Native(format!("column '{name}': unknown dtype '{dtype}'")))?;
        let mut data = ColumnData::nulls(dtype, nrows);

        if let ColumnData::Categorical { categories, .. } = &mut data {
            let mut cat_stmt =
                conn.prepare("SELECT label FROM categories WHERE position = ?1 ORDER BY code")?;
            *categories = cat_stmt
                .query_map(params![pos], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
        }

        let mut cell_stmt = conn.prepare(
            "SELECT row, value_int, value_real, value_text FROM cells WHERE position = ?1 ORDER BY row",
        )?;
        let mut rows = cell_stmt.query(params![pos])?;
        while let Some(row) = rows.next()? {
            let r: i64 = row.get(0)?;
            let r = usize::try_from(r)
                .ok()
                .filter(|&r| r < nrows)
                .ok_or_else(|| IoError::Native(format!("column '{name}': row {r} out of range")))?;
            let cell: Encoded = (row.get(1)?, row.get(2)?, row.get(3)?);
            decode_cell(&mut data, r, cell)
                .map_err(|msg| IoError::Native(format!("column '{name}', row {r}: {msg}")))?;
        }

        columns.push(Column::new(name, data));
    }

    let mut frame = Frame::new(columns)?;
    frame.description = description;
    debug!(path = %path.display(), rows = frame.nrows(), cols = frame.ncols(), "loaded table artifact");
    Ok(frame)
}

fn decode_cell(data: &mut ColumnData, row: usize, cell: Encoded) -> Result<(), String> {
    match (data, cell) {
        (ColumnData::Int64(v), (Some(n), _, _)) => v[row] = Some(n),
        (ColumnData::Int32(v), (Some(n), _, _)) => {
            v[row] = Some(i32::try_from(n).map_err(|_| format!("{n} does not fit int32"))?)
        }
        (ColumnData::Float64(v), (_, Some(x), _)) => v[row] = Some(x),
        (ColumnData::Float64(v), (_, _, Some(t))) => {
            v[row] = Some(t.parse().map_err(|_| format!("bad float '{t}'"))?)
        }
        (ColumnData::Str(v), (_, _, Some(t))) => v[row] = Some(t),
        (ColumnData::Categorical { categories, codes }, (Some(c), _, _)) => {
            if c < 0 || c as usize >= categories.len() {
                return Err(format!("category code {c} out of range"));
            }
            codes[row] = Some(c as u32);
        }
        (ColumnData::Date(v), (_, _, Some(t))) => {
            v[row] = Some(
                NaiveDate::parse_from_str(&t, "%Y-%m-%d").map_err(|_| format!("bad date '{t}'"))?,
            )
        }
        (data, _) => return Err(format!("cell does not match dtype {}", data.dtype())),
    }
    Ok(())
}

/// BLAKE3 digest of a file, hex encoded.
pub fn fingerprint(path: &Path) -> Result<String, IoError> {
    let bytes = std::fs::read(path).map_err(|e| IoError::file(path, e))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
