use std::fmt;
use std::path::PathBuf;

use bbb_frame::FrameError;

/// Error type for source loading, artifact persistence, and reference fetch.
#[derive(Debug)]
pub enum IoError {
    /// File could not be opened, read, or written.
    File { path: PathBuf, message: String },
    /// Delimited text could not be parsed.
    Delimited { path: PathBuf, message: String },
    /// Spreadsheet could not be opened or read.
    Spreadsheet { path: PathBuf, message: String },
    /// SQLite error.
    Sqlite(String),
    /// Required table missing from the database.
    MissingTable(String),
    /// Required field missing from a table.
    MissingField { table: String, field: String },
    /// Native artifact is malformed or from an unsupported version.
    Native(String),
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// Loaded data does not form a valid frame.
    Frame(FrameError),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path, message } => write!(f, "{}: {message}", path.display()),
            Self::Delimited { path, message } => {
                write!(f, "{}: parse error: {message}", path.display())
            }
            Self::Spreadsheet { path, message } => {
                write!(f, "{}: spreadsheet error: {message}", path.display())
            }
            Self::Sqlite(msg) => write!(f, "SQLite error: {msg}"),
            Self::MissingTable(table) => write!(f, "database has no table '{table}'"),
            Self::MissingField { table, field } => {
                write!(f, "table '{table}' has no field '{field}'")
            }
            Self::Native(msg) => write!(f, "table artifact error: {msg}"),
            Self::Network(msg) => write!(f, "Network error: {msg}"),
            Self::Http(code, msg) => write!(f, "HTTP {code}: {msg}"),
            Self::Frame(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Frame(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FrameError> for IoError {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

impl From<rusqlite::Error> for IoError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e.to_string())
    }
}

impl IoError {
    pub(crate) fn file(path: impl Into<PathBuf>, e: impl fmt::Display) -> Self {
        Self::File { path: path.into(), message: e.to_string() }
    }
}
