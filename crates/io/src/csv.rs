// CSV/TSV import

use std::io::Read;
use std::path::Path;

use bbb_frame::{Column, Frame};
use tracing::debug;

use crate::error::IoError;

/// Read a delimited file with a header row into a frame of string columns.
///
/// Empty fields become nulls.
pub fn import(path: &Path, delimiter: u8) -> Result<Frame, IoError> {
    let content = read_file_as_utf8(path)?;
    let frame = import_from_string(&content, delimiter).map_err(|message| IoError::Delimited {
        path: path.to_path_buf(),
        message,
    })?;
    debug!(
        path = %path.display(),
        rows = frame.nrows(),
        cols = frame.ncols(),
        "imported delimited file"
    );
    Ok(frame)
}

pub fn import_tsv(path: &Path) -> Result<Frame, IoError> {
    import(path, b'\t')
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file = std::fs::File::open(path).map_err(|e| IoError::file(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| IoError::file(path, e))?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported text)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn import_from_string(content: &str, delimiter: u8) -> Result<Frame, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        for (col, field) in values.iter_mut().zip(record.iter()) {
            col.push(if field.is_empty() { None } else { Some(field.to_string()) });
        }
    }

    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, vals)| Column::str(name, vals))
        .collect();
    Frame::new(columns).map_err(|e| e.to_string())
}
