// Human-readable summary of a frame

use crate::column::{ColumnData, Value};
use crate::frame::Frame;

/// Render the description followed by one line per column.
///
/// Numeric columns show min/mean/max over non-null values, categoricals list
/// their categories, other columns show the first value.
pub fn describe(frame: &Frame) -> String {
    let mut out = String::new();

    if let Some(ref desc) = frame.description {
        out.push_str(desc.trim_end());
        out.push_str("\n\n");
    }

    out.push_str(&format!("Rows: {}\nColumns: {}\n\n", frame.nrows(), frame.ncols()));

    let name_w = frame
        .columns()
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0)
        .max(6);

    out.push_str(&format!("{:<name_w$}  {:<8}  {:>8}  summary\n", "column", "dtype", "non-null"));
    for col in frame.columns() {
        let non_null = col.len() - col.data.null_count();
        let summary = match &col.data {
            ColumnData::Categorical { categories, .. } => {
                format!("categories: {}", categories.join(", "))
            }
            data if col.dtype().is_numeric() => numeric_summary(data),
            data => match (0..data.len()).map(|i| data.get(i)).find(|v| !v.is_null()) {
                Some(v) => format!("e.g. {v}"),
                None => String::new(),
            },
        };
        out.push_str(&format!(
            "{:<name_w$}  {:<8}  {:>8}  {}\n",
            col.name,
            col.dtype().as_str(),
            non_null,
            summary
        ));
    }
    out
}

fn numeric_summary(data: &ColumnData) -> String {
    let values: Vec<f64> = (0..data.len())
        .filter_map(|i| match data.get(i) {
            Value::Int(n) => Some(n as f64),
            Value::Float(x) if !x.is_nan() => Some(x),
            _ => None,
        })
        .collect();
    if values.is_empty() {
        return String::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    format!("min {min}  mean {mean:.2}  max {max}")
}
