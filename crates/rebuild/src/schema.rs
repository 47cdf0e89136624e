// Target layout of the rebuilt table.

use bbb_frame::{DType, Frame, Value};

use crate::error::RebuildError;

/// Output columns, in order, with their final dtypes.
pub const TARGET: [(&str, DType); 20] = [
    ("acctnum", DType::Str),
    ("gender", DType::Categorical),
    ("state", DType::Categorical),
    ("zip", DType::Str),
    ("zip3", DType::Str),
    ("first", DType::Int32),
    ("last", DType::Int32),
    ("book", DType::Int32),
    ("nonbook", DType::Int32),
    ("total", DType::Int32),
    ("purch", DType::Int32),
    ("child", DType::Int32),
    ("youth", DType::Int32),
    ("cook", DType::Int32),
    ("do_it", DType::Int32),
    ("reference", DType::Int32),
    ("art", DType::Int32),
    ("geog", DType::Int32),
    ("buyer", DType::Categorical),
    ("training", DType::Int32),
];

pub fn column_names() -> Vec<&'static str> {
    TARGET.iter().map(|(name, _)| *name).collect()
}

/// Columns filled with zero where a join found no match.
pub fn zero_filled() -> impl Iterator<Item = &'static str> {
    TARGET
        .iter()
        .filter(|(name, dtype)| *dtype == DType::Int32 && *name != "purch" && *name != "total")
        .map(|(name, _)| *name)
}

/// Select the target columns in order and cast each to its target dtype.
/// Any other column is dropped; a missing one is an error.
pub fn conform(frame: &Frame) -> Result<Frame, RebuildError> {
    let mut out = frame.select(&column_names())?;
    for (name, dtype) in TARGET {
        out.cast(name, dtype)?;
    }
    Ok(out)
}

/// Replace nulls in every integer-valued target column with zero.
pub fn fill_missing_counts(frame: &mut Frame) -> Result<(), RebuildError> {
    for name in zero_filled() {
        if frame.has_column(name) {
            frame.fill_null(name, &Value::Int(0))?;
        }
    }
    Ok(())
}
