//! `bbb-frame`: column table model.
//!
//! Typed nullable columns, frames with an attached description, left joins,
//! dtype casts, and deep comparison. No IO.

pub mod column;
pub mod compare;
pub mod describe;
pub mod error;
pub mod frame;

pub use column::{Column, ColumnData, DType, Value};
pub use compare::{compare, frames_equal, FrameComparison};
pub use describe::describe;
pub use error::FrameError;
pub use frame::Frame;
