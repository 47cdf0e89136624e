use std::fmt;

use bbb_frame::{DType, FrameComparison, FrameError};
use bbb_io::IoError;

/// Which input a load failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Demographics,
    Nonbook,
    Database,
    Description,
}

impl Input {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Demographics => "demographics",
            Self::Nonbook => "nonbook",
            Self::Database => "database",
            Self::Description => "description",
        }
    }
}

/// Why the description check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionIssue {
    /// The rebuilt table carries no description.
    Missing,
    /// It carries one, but not the reference's.
    Differs,
}

/// Detail of a failed frame check.
#[derive(Debug, Clone)]
pub struct MismatchReport {
    pub comparison: FrameComparison,
}

impl fmt::Display for MismatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.comparison)?;
        write!(f, "{}", self.comparison.dtype_table("rebuilt", "reference"))
    }
}

#[derive(Debug)]
pub enum RebuildError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error.
    ConfigValidation(String),
    /// A source input could not be read.
    Load { input: Input, error: IoError },
    /// The reference table could not be fetched or read.
    Reference(IoError),
    /// The output artifact could not be written.
    Write(IoError),
    /// Frame operation failed while transforming.
    Frame(FrameError),
    /// A purchase row names a category outside the known seven.
    UnknownCategory { acctnum: i64, category: String },
    /// A purchase date offset does not land on a representable date.
    DateOutOfRange { acctnum: i64, offset: i64 },
    /// A source lacks a required column.
    MissingColumn { input: Input, column: String },
    /// A column that feeds counts or dates holds text.
    NonNumericColumn { input: Input, column: String, dtype: DType, sample: Option<String> },
    /// A required value is null in a source row.
    MissingValue { input: Input, field: String, row: usize },
    /// The demographics file lists an account more than once.
    DuplicateAccount(String),
    /// Rebuilt data differs from the reference.
    FrameMismatch(Box<MismatchReport>),
    /// Rebuilt data matches but the description does not.
    DescriptionMismatch(DescriptionIssue),
}

impl fmt::Display for RebuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Load { input, error } => write!(f, "cannot load {}: {error}", input.as_str()),
            Self::Reference(e) => write!(f, "cannot load reference table: {e}"),
            Self::Write(e) => write!(f, "cannot write output: {e}"),
            Self::Frame(e) => write!(f, "{e}"),
            Self::UnknownCategory { acctnum, category } => {
                write!(f, "account {acctnum}: unknown purchase category '{category}'")
            }
            Self::DateOutOfRange { acctnum, offset } => {
                write!(f, "account {acctnum}: purchase date offset {offset} is out of range")
            }
            Self::MissingColumn { input, column } => {
                write!(f, "{}: missing column '{column}'", input.as_str())
            }
            Self::NonNumericColumn { input, column, dtype, sample } => {
                write!(f, "{}: column '{column}' must be numeric, found {dtype}", input.as_str())?;
                if let Some(sample) = sample {
                    write!(f, " (e.g. '{sample}')")?;
                }
                Ok(())
            }
            Self::MissingValue { input, field, row } => {
                write!(f, "{}: row {row} has no value for '{field}'", input.as_str())
            }
            Self::DuplicateAccount(acct) => {
                write!(f, "demographics: account {acct} appears more than once")
            }
            Self::FrameMismatch(_) => write!(
                f,
                "Test of equality of data frames failed. Use the dtype table to look for \
                 differences in types and the per-column mismatch counts to find wrong values"
            ),
            Self::DescriptionMismatch(issue) => {
                let detail = match issue {
                    DescriptionIssue::Missing => "the rebuilt table has no description",
                    DescriptionIssue::Differs => "the rebuilt table's description differs",
                };
                write!(
                    f,
                    "Test of equality of descriptions failed ({detail}). Attach the description \
                     read from the description text file to the rebuilt table"
                )
            }
        }
    }
}

impl std::error::Error for RebuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load { error, .. } => Some(error),
            Self::Reference(e) | Self::Write(e) => Some(e),
            Self::Frame(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FrameError> for RebuildError {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

impl RebuildError {
    pub(crate) fn load(input: Input) -> impl FnOnce(IoError) -> Self {
        move |error| Self::Load { input, error }
    }

    /// Mismatch detail, when this is a frame check failure.
    pub fn mismatch_report(&self) -> Option<&MismatchReport> {
        match self {
            Self::FrameMismatch(report) => Some(report),
            _ => None,
        }
    }
}
