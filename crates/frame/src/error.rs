use std::fmt;

use crate::column::DType;

#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    /// A column's length differs from the frame's row count.
    LengthMismatch { column: String, expected: usize, found: usize },
    /// Two columns share a name.
    DuplicateColumn(String),
    /// Referenced column does not exist.
    UnknownColumn(String),
    /// Column has a different dtype than the operation requires.
    DTypeMismatch { column: String, expected: DType, found: DType },
    /// A value could not be converted between dtypes.
    Cast { column: String, value: String, from: DType, to: DType },
    /// No conversion exists between the two dtypes.
    UnsupportedCast { column: String, from: DType, to: DType },
    /// Right side of a left join has the same key more than once.
    DuplicateJoinKey { column: String, key: String },
    /// Join key columns have different dtypes on each side.
    JoinKeyDType { column: String, left: DType, right: DType },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { column, expected, found } => {
                write!(f, "column '{column}': expected {expected} rows, found {found}")
            }
            Self::DuplicateColumn(name) => write!(f, "duplicate column '{name}'"),
            Self::UnknownColumn(name) => write!(f, "unknown column '{name}'"),
            Self::DTypeMismatch { column, expected, found } => {
                write!(f, "column '{column}': expected dtype {expected}, found {found}")
            }
            Self::Cast { column, value, from, to } => {
                write!(f, "column '{column}': cannot cast '{value}' from {from} to {to}")
            }
            Self::UnsupportedCast { column, from, to } => {
                write!(f, "column '{column}': no cast from {from} to {to}")
            }
            Self::DuplicateJoinKey { column, key } => {
                write!(f, "join key '{column}': value '{key}' appears more than once on the right side")
            }
            Self::JoinKeyDType { column, left, right } => {
                write!(f, "join key '{column}': left is {left}, right is {right}")
            }
        }
    }
}

impl std::error::Error for FrameError {}
