// Deep comparison of two frames.
// Pure functions: two frames in, a structured report out. No IO.

use std::fmt;

use crate::column::{ColumnData, DType, Value};
use crate::frame::Frame;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Per-column comparison, aligned by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnComparison {
    pub name: String,
    pub left: Option<DType>,
    pub right: Option<DType>,
    /// Rows whose values differ. Only meaningful when both sides exist and
    /// row counts agree.
    pub mismatches: usize,
    /// Categorical category lists differ (same labels, different domain).
    pub categories_differ: bool,
}

impl ColumnComparison {
    pub fn dtype_matches(&self) -> bool {
        self.left.is_some() && self.left == self.right
    }

    pub fn is_equal(&self) -> bool {
        self.dtype_matches() && self.mismatches == 0 && !self.categories_differ
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameComparison {
    pub left_shape: (usize, usize),
    pub right_shape: (usize, usize),
    /// Column names in the same order on both sides.
    pub same_order: bool,
    pub columns: Vec<ColumnComparison>,
}

impl FrameComparison {
    pub fn is_equal(&self) -> bool {
        self.left_shape == self.right_shape
            && self.same_order
            && self.columns.iter().all(|c| c.is_equal())
    }

    pub fn mismatched_columns(&self) -> impl Iterator<Item = &ColumnComparison> {
        self.columns.iter().filter(|c| !c.is_equal())
    }

    /// Side-by-side dtype table: `column  left  right  check`.
    pub fn dtype_table(&self, left_label: &str, right_label: &str) -> String {
        let name_w = self
            .columns
            .iter()
            .map(|c| c.name.len())
            .chain(std::iter::once(6))
            .max()
            .unwrap_or(6);
        let left_w = left_label.len().max(8);
        let right_w = right_label.len().max(8);

        let mut out = format!(
            "{:<name_w$}  {:<left_w$}  {:<right_w$}  check\n",
            "column", left_label, right_label
        );
        for c in &self.columns {
            let l = c.left.map(|d| d.as_str()).unwrap_or("-");
            let r = c.right.map(|d| d.as_str()).unwrap_or("-");
            out.push_str(&format!(
                "{:<name_w$}  {:<left_w$}  {:<right_w$}  {}\n",
                c.name,
                l,
                r,
                if c.dtype_matches() { "true" } else { "false" }
            ));
        }
        out
    }
}

impl fmt::Display for FrameComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.left_shape != self.right_shape {
            writeln!(
                f,
                "shape: {}x{} vs {}x{}",
                self.left_shape.0, self.left_shape.1, self.right_shape.0, self.right_shape.1
            )?;
        }
        if !self.same_order {
            writeln!(f, "column order differs")?;
        }
        for c in self.mismatched_columns() {
            match (c.left, c.right) {
                (Some(l), Some(r)) if l != r => writeln!(f, "  {}: dtype {l} vs {r}", c.name)?,
                (Some(_), None) => writeln!(f, "  {}: missing on right", c.name)?,
                (None, Some(_)) => writeln!(f, "  {}: missing on left", c.name)?,
                _ => {
                    if c.categories_differ {
                        writeln!(f, "  {}: categories differ", c.name)?;
                    }
                    if c.mismatches > 0 {
                        writeln!(f, "  {}: {} value mismatch(es)", c.name, c.mismatches)?;
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Compare two frames column by column.
///
/// Columns are aligned by name (left order first, then right-only columns).
/// Values are compared positionally; floats compare equal when both are NaN.
pub fn compare(left: &Frame, right: &Frame) -> FrameComparison {
    let left_names = left.column_names();
    let right_names = right.column_names();
    let same_order = left_names == right_names;
    let same_rows = left.nrows() == right.nrows();

    let mut columns = Vec::new();
    for lc in left.columns() {
        let rc = right.column(&lc.name).ok();
        let mut cmp = ColumnComparison {
            name: lc.name.clone(),
            left: Some(lc.dtype()),
            right: rc.map(|c| c.dtype()),
            mismatches: 0,
            categories_differ: false,
        };
        if let Some(rc) = rc {
            if same_rows && lc.dtype() == rc.dtype() {
                cmp.mismatches = (0..left.nrows())
                    .filter(|&i| !values_equal(&lc.get(i), &rc.get(i)))
                    .count();
                if let (
                    ColumnData::Categorical { categories: a, .. },
                    ColumnData::Categorical { categories: b, .. },
                ) = (&lc.data, &rc.data)
                {
                    cmp.categories_differ = a != b;
                }
            }
        }
        columns.push(cmp);
    }
    for rc in right.columns().iter().filter(|c| !left.has_column(&c.name)) {
        columns.push(ColumnComparison {
            name: rc.name.clone(),
            left: None,
            right: Some(rc.dtype()),
            mismatches: 0,
            categories_differ: false,
        });
    }

    FrameComparison {
        left_shape: left.shape(),
        right_shape: right.shape(),
        same_order,
        columns,
    }
}

/// Structural and value equality, ignoring the description.
pub fn frames_equal(left: &Frame, right: &Frame) -> bool {
    compare(left, right).is_equal()
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => x == y || (x.is_nan() && y.is_nan()),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    fn frame() -> Frame {
        Frame::new(vec![
            Column::str("acctnum", vec![s("1"), s("2")]),
            Column::categorical("buyer", &[s("no"), s("yes")]),
            Column::int32("book", vec![Some(10), Some(20)]),
        ])
        .unwrap()
    }

    #[test]
    fn identical_frames_are_equal() {
        assert!(frames_equal(&frame(), &frame()));
    }

    #[test]
    fn counts_value_mismatches_per_column() {
        let mut other = frame();
        other
            .replace_column(Column::int32("book", vec![Some(11), Some(20)]))
            .unwrap();
        let cmp = compare(&frame(), &other);
        assert!(!cmp.is_equal());
        let bad: Vec<_> = cmp.mismatched_columns().collect();
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].name, "book");
        assert_eq!(bad[0].mismatches, 1);
        assert!(cmp.to_string().contains("book: 1 value mismatch(es)"));
    }

    #[test]
    fn dtype_difference_is_reported() {
        let mut other = frame();
        other.cast("book", DType::Int64).unwrap();
        let cmp = compare(&frame(), &other);
        assert!(!cmp.is_equal());
        let table = cmp.dtype_table("rebuilt", "reference");
        assert!(table.contains("book"));
        assert!(table.lines().any(|l| l.starts_with("book") && l.ends_with("false")));
        assert!(cmp.to_string().contains("dtype int32 vs int64"));
    }

    #[test]
    fn column_order_matters() {
        let other = frame().select(&["buyer", "acctnum", "book"]).unwrap();
        let cmp = compare(&frame(), &other);
        assert!(!cmp.same_order);
        assert!(!cmp.is_equal());
    }

    #[test]
    fn category_domain_matters() {
        let mut other = frame();
        other
            .replace_column(Column::categorical("buyer", &[s("no"), s("yes")]))
            .unwrap();
        assert!(frames_equal(&frame(), &other));

        // Same visible values, extra category in the domain.
        other
            .replace_column(Column::new(
                "buyer",
                ColumnData::Categorical {
                    categories: vec!["maybe".into(), "no".into(), "yes".into()],
                    codes: vec![Some(1), Some(2)],
                },
            ))
            .unwrap();
        let cmp = compare(&frame(), &other);
        assert!(!cmp.is_equal());
        assert!(cmp.to_string().contains("categories differ"));
    }

    #[test]
    fn missing_columns_and_shape() {
        let other = frame().select(&["acctnum", "buyer"]).unwrap();
        let cmp = compare(&frame(), &other);
        assert_eq!(cmp.left_shape, (2, 3));
        assert_eq!(cmp.right_shape, (2, 2));
        assert!(cmp.to_string().contains("book: missing on right"));
    }

    #[test]
    fn nan_equals_nan() {
        let a = Frame::new(vec![Column::float64("x", vec![Some(f64::NAN), None])]).unwrap();
        let b = a.clone();
        assert!(frames_equal(&a, &b));
    }

    #[test]
    fn description_is_not_part_of_frame_equality() {
        let a = frame().with_description("one");
        let b = frame().with_description("two");
        assert!(frames_equal(&a, &b));
    }
}
