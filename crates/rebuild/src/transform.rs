// Field-level transforms: ZIP codes, date offsets, month differences.

use chrono::{Datelike, Days, NaiveDate};

use bbb_frame::{Column, Frame};

use crate::error::RebuildError;

pub const ZIP_WIDTH: usize = 5;
pub const ZIP3_WIDTH: usize = 3;

/// Left-pad `s` with zeros to `width` characters. Longer input is unchanged.
pub fn zero_pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    let mut out = "0".repeat(width - len);
    out.push_str(s);
    out
}

/// First three characters of a (padded) ZIP code.
pub fn zip3(zip: &str) -> String {
    zip.chars().take(ZIP3_WIDTH).collect()
}

/// `epoch` plus `offset` days; `None` when the result is not representable.
pub fn date_from_offset(epoch: NaiveDate, offset: i64) -> Option<NaiveDate> {
    let days = Days::new(offset.unsigned_abs());
    if offset >= 0 {
        epoch.checked_add_days(days)
    } else {
        epoch.checked_sub_days(days)
    }
}

/// Whole-month difference from `earlier` to `later`, ignoring the day of month.
pub fn months_between(later: NaiveDate, earlier: NaiveDate) -> i64 {
    let years = i64::from(later.year()) - i64::from(earlier.year());
    let months = i64::from(later.month()) - i64::from(earlier.month());
    years * 12 + months
}

/// Zero-pad the `zip` column and insert `zip3` right after it.
///
/// Numeric ZIP columns (e.g. read as integers) are rendered as text first.
pub fn normalize_zip(frame: &Frame) -> Result<Frame, RebuildError> {
    let zip = frame.column("zip")?.cast(bbb_frame::DType::Str)?;
    let padded: Vec<Option<String>> = zip
        .as_str()?
        .iter()
        .map(|z| z.as_deref().map(|z| zero_pad(z.trim(), ZIP_WIDTH)))
        .collect();
    let prefixes: Vec<Option<String>> =
        padded.iter().map(|z| z.as_deref().map(zip3)).collect();

    let mut columns = Vec::with_capacity(frame.ncols() + 1);
    for col in frame.columns() {
        if col.name == "zip" {
            columns.push(Column::str("zip", padded.clone()));
            columns.push(Column::str("zip3", prefixes.clone()));
        } else if col.name != "zip3" {
            columns.push(col.clone());
        }
    }
    let mut out = Frame::new(columns)?;
    out.description = frame.description.clone();
    Ok(out)
}
