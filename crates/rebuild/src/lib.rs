//! `bbb-rebuild`: Bookbinders account table reconstruction.
//!
//! Loads the raw sources, rebuilds the per-account table, verifies it
//! against a reference table, and writes it only when both checks pass.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod schema;
pub mod transform;
pub mod validate;

pub use config::RebuildConfig;
pub use engine::{build, publish, rebuild, run, RunOutcome, Sources};
pub use error::{DescriptionIssue, Input, MismatchReport, RebuildError};
