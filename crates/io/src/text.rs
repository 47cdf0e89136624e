// Plain-text description files

use std::path::Path;

use tracing::debug;

use crate::csv::read_file_as_utf8;
use crate::error::IoError;

/// Read a description file verbatim (UTF-8, Windows-1252 fallback).
///
/// A leading byte-order mark is dropped; everything else, trailing newline
/// included, is kept as written.
pub fn read_description(path: &Path) -> Result<String, IoError> {
    let content = read_file_as_utf8(path)?;
    let content = content.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(content);
    debug!(path = %path.display(), chars = content.chars().count(), "read description");
    Ok(content)
}
