// File I/O operations

pub mod csv;
pub mod error;
pub mod fetch;
pub mod native;
pub mod sqlite;
pub mod text;
pub mod xlsx;

pub use error::IoError;
pub use fetch::ReferenceSource;

/// Native table artifact format version
/// Increment when schema changes in a way that old versions can't read
pub const NATIVE_FORMAT_VERSION: u32 = 1;
