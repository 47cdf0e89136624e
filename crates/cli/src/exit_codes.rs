//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                         |
//! |------|-------------------------------------------------|
//! | 0    | Both checks passed, output written              |
//! | 1    | General error (unspecified)                     |
//! | 2    | Usage error (bad args, unreadable/invalid config) |
//! | 3    | Rebuilt table differs from the reference        |
//! | 4    | Description missing or different                |
//! | 5    | A source input could not be loaded or is invalid |
//! | 6    | Reference table could not be fetched or read    |
//! | 7    | Output artifact could not be written            |

use bbb_rebuild::RebuildError;

/// Success - both checks passed and the output was written.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable or invalid config.
pub const EXIT_USAGE: u8 = 2;

/// Frame check failed.
pub const EXIT_FRAME_MISMATCH: u8 = 3;

/// Description check failed.
pub const EXIT_DESCRIPTION_MISMATCH: u8 = 4;

/// Source file missing, unreadable, or with invalid content.
pub const EXIT_LOAD: u8 = 5;

/// Reference table fetch or read failed.
pub const EXIT_REFERENCE: u8 = 6;

/// Output write failed.
pub const EXIT_WRITE: u8 = 7;

/// Map a pipeline error to its exit code.
pub fn rebuild_exit_code(err: &RebuildError) -> u8 {
    match err {
        RebuildError::ConfigParse(_) | RebuildError::ConfigValidation(_) => EXIT_USAGE,
        RebuildError::FrameMismatch(_) => EXIT_FRAME_MISMATCH,
        RebuildError::DescriptionMismatch(_) => EXIT_DESCRIPTION_MISMATCH,
        RebuildError::Load { .. }
        | RebuildError::MissingColumn { .. }
        | RebuildError::NonNumericColumn { .. }
        | RebuildError::MissingValue { .. }
        | RebuildError::DuplicateAccount(_)
        | RebuildError::UnknownCategory { .. }
        | RebuildError::DateOutOfRange { .. } => EXIT_LOAD,
        RebuildError::Reference(_) => EXIT_REFERENCE,
        RebuildError::Write(_) => EXIT_WRITE,
        RebuildError::Frame(_) => EXIT_ERROR,
    }
}
