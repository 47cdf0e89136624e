// Per-account purchase aggregation: recency and category counts.
// Pure functions over decoded purchase rows. No IO.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use bbb_frame::{Column, DType, Frame};

use crate::error::{Input, RebuildError};
use crate::transform::{date_from_offset, months_between};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Book category of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Child,
    Youth,
    Cook,
    DoIt,
    Reference,
    Art,
    Geog,
}

impl Category {
    /// Output column order.
    pub const ALL: [Category; 7] = [
        Self::Child,
        Self::Youth,
        Self::Cook,
        Self::DoIt,
        Self::Reference,
        Self::Art,
        Self::Geog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Child => "child",
            Self::Youth => "youth",
            Self::Cook => "cook",
            Self::DoIt => "do_it",
            Self::Reference => "reference",
            Self::Art => "art",
            Self::Geog => "geog",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s.trim())
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// One row of the `purchase` table, typed.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub acctnum: i64,
    pub date: NaiveDate,
    pub category: Category,
    pub price: f64,
}

/// Decode the `purchase` table. Dates are day offsets from `epoch`.
///
/// A null price counts as zero; any other null, an unknown category, or an
/// unrepresentable date is an error.
pub fn decode_purchases(frame: &Frame, epoch: NaiveDate) -> Result<Vec<Purchase>, RebuildError> {
    let acct = frame.column("acctnum")?.cast(DType::Int64)?;
    let date = frame.column("date")?.cast(DType::Int64)?;
    let category = frame.column("purchase")?.cast(DType::Str)?;
    let price = frame.column("price")?.cast(DType::Float64)?;

    let (acct, date, category, price) =
        (acct.as_int64()?, date.as_int64()?, category.as_str()?, price.as_float64()?);

    let missing = |field: &str, row: usize| RebuildError::MissingValue {
        input: Input::Database,
        field: field.to_string(),
        row,
    };

    let mut out = Vec::with_capacity(frame.nrows());
    for row in 0..frame.nrows() {
        let acctnum = acct[row].ok_or_else(|| missing("acctnum", row))?;
        let offset = date[row].ok_or_else(|| missing("date", row))?;
        let label = category[row].as_deref().ok_or_else(|| missing("purchase", row))?;

        let category = Category::parse(label).ok_or_else(|| RebuildError::UnknownCategory {
            acctnum,
            category: label.to_string(),
        })?;
        let date = date_from_offset(epoch, offset)
            .ok_or(RebuildError::DateOutOfRange { acctnum, offset })?;

        out.push(Purchase { acctnum, date, category, price: price[row].unwrap_or(0.0) });
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Months since the earliest (`first`) and latest (`last`) purchase, per
/// account, relative to `reference_date`. One row per purchasing account,
/// ordered by account number.
pub fn recency(purchases: &[Purchase], reference_date: NaiveDate) -> Result<Frame, RebuildError> {
    let mut spans: BTreeMap<i64, (NaiveDate, NaiveDate)> = BTreeMap::new();
    for p in purchases {
        spans
            .entry(p.acctnum)
            .and_modify(|(lo, hi)| {
                *lo = (*lo).min(p.date);
                *hi = (*hi).max(p.date);
            })
            .or_insert((p.date, p.date));
    }

    let mut acct = Vec::with_capacity(spans.len());
    let mut first = Vec::with_capacity(spans.len());
    let mut last = Vec::with_capacity(spans.len());
    for (a, (lo, hi)) in spans {
        acct.push(Some(a));
        first.push(Some(months_between(reference_date, lo)));
        last.push(Some(months_between(reference_date, hi)));
    }

    Ok(Frame::new(vec![
        Column::int64("acctnum", acct),
        Column::int64("first", first),
        Column::int64("last", last),
    ])?)
}

#[derive(Default)]
struct Tally {
    book: f64,
    counts: [i64; 7],
}

/// Summed price (`book`) and per-category purchase counts, per account.
/// One row per purchasing account, ordered by account number.
pub fn category_totals(purchases: &[Purchase]) -> Result<Frame, RebuildError> {
    let mut tallies: BTreeMap<i64, Tally> = BTreeMap::new();
    for p in purchases {
        let tally = tallies.entry(p.acctnum).or_default();
        tally.book += p.price;
        tally.counts[p.category.index()] += 1;
    }

    let acct: Vec<Option<i64>> = tallies.keys().map(|&a| Some(a)).collect();
    let book: Vec<Option<f64>> = tallies.values().map(|t| Some(t.book)).collect();

    let mut columns = vec![Column::int64("acctnum", acct), Column::float64("book", book)];
    for cat in Category::ALL {
        let counts = tallies.values().map(|t| Some(t.counts[cat.index()])).collect();
        columns.push(Column::int64(cat.as_str(), counts));
    }
    Ok(Frame::new(columns)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
