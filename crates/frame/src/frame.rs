// Ordered set of equal-length named columns

use std::collections::HashMap;

use crate::column::{Column, ColumnData, DType, Value};
use crate::error::FrameError;

#[derive(Debug, Clone, Default)]
pub struct Frame {
    columns: Vec<Column>,
    nrows: usize,
    /// Free-text description carried alongside the data.
    pub description: Option<String>,
}

impl Frame {
    pub fn new(columns: Vec<Column>) -> Result<Self, FrameError> {
        let nrows = columns.first().map(|c| c.len()).unwrap_or(0);
        let mut frame = Self { columns: Vec::with_capacity(columns.len()), nrows, description: None };
        for col in columns {
            frame.push_column(col)?;
        }
        Ok(frame)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.columns.len())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn dtypes(&self) -> Vec<(&str, DType)> {
        self.columns.iter().map(|c| (c.name.as_str(), c.dtype())).collect()
    }

    fn position(&self, name: &str) -> Result<usize, FrameError> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| FrameError::UnknownColumn(name.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column, FrameError> {
        let idx = self.position(name)?;
        Ok(&self.columns[idx])
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column, FrameError> {
        let idx = self.position(name)?;
        Ok(&mut self.columns[idx])
    }

    /// Append a column. The first column of an empty frame fixes the row count.
    pub fn push_column(&mut self, column: Column) -> Result<(), FrameError> {
        if self.has_column(&column.name) {
            return Err(FrameError::DuplicateColumn(column.name));
        }
        let found = column.len();
        if self.columns.is_empty() {
            self.nrows = found;
        } else if found != self.nrows {
            return Err(FrameError::LengthMismatch {
                column: column.name,
                expected: self.nrows,
                found,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Replace a column in place, keeping its position.
    pub fn replace_column(&mut self, column: Column) -> Result<(), FrameError> {
        let idx = self.position(&column.name)?;
        let found = column.len();
        if found != self.nrows {
            return Err(FrameError::LengthMismatch {
                column: column.name,
                expected: self.nrows,
                found,
            });
        }
        self.columns[idx] = column;
        Ok(())
    }

    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), FrameError> {
        if from != to && self.has_column(to) {
            return Err(FrameError::DuplicateColumn(to.to_string()));
        }
        self.column_mut(from)?.name = to.to_string();
        Ok(())
    }

    /// New frame with exactly `names`, in that order. Description is kept.
    pub fn select(&self, names: &[&str]) -> Result<Frame, FrameError> {
        let columns = names
            .iter()
            .map(|n| self.column(n).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = Frame::new(columns)?;
        out.nrows = self.nrows;
        out.description = self.description.clone();
        Ok(out)
    }

    pub fn cast(&mut self, name: &str, to: DType) -> Result<(), FrameError> {
        let idx = self.position(name)?;
        self.columns[idx] = self.columns[idx].cast(to)?;
        Ok(())
    }

    pub fn fill_null(&mut self, name: &str, value: &Value) -> Result<(), FrameError> {
        self.column_mut(name)?.fill_null(value)
    }

    /// Left join on `key`.
    ///
    /// Every row of `self` is kept, in order. Right rows are matched by key;
    /// right non-key columns are appended and are null where nothing matched.
    /// The key must be `Int64` or `Str` on both sides and unique on the right.
    pub fn left_join(&self, right: &Frame, key: &str) -> Result<Frame, FrameError> {
        let left_key = self.column(key)?;
        let right_key = right.column(key)?;
        if left_key.dtype() != right_key.dtype() {
            return Err(FrameError::JoinKeyDType {
                column: key.to_string(),
                left: left_key.dtype(),
                right: right_key.dtype(),
            });
        }

        let indices: Vec<Option<usize>> = match (&left_key.data, &right_key.data) {
            (ColumnData::Int64(l), ColumnData::Int64(r)) => match_keys(key, l, r)?,
            (ColumnData::Str(l), ColumnData::Str(r)) => match_keys(key, l, r)?,
            _ => {
                return Err(FrameError::DTypeMismatch {
                    column: key.to_string(),
                    expected: DType::Int64,
                    found: left_key.dtype(),
                })
            }
        };

        let mut out = self.clone();
        for col in right.columns.iter().filter(|c| c.name != key) {
            out.push_column(Column::new(col.name.clone(), col.data.take(&indices)))?;
        }
        Ok(out)
    }

    /// Row `i` as values, in column order.
    pub fn row(&self, i: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.get(i)).collect()
    }
}

fn match_keys<T>(
    key: &str,
    left: &[Option<T>],
    right: &[Option<T>],
) -> Result<Vec<Option<usize>>, FrameError>
where
    T: std::hash::Hash + Eq + ToString,
{
    let mut lookup: HashMap<&T, usize> = HashMap::with_capacity(right.len());
    for (i, k) in right.iter().enumerate() {
        if let Some(k) = k {
            if lookup.insert(k, i).is_some() {
                return Err(FrameError::DuplicateJoinKey {
                    column: key.to_string(),
                    key: k.to_string(),
                });
            }
        }
    }

    Ok(left
        .iter()
        .map(|k| k.as_ref().and_then(|k| lookup.get(k).copied()))
        .collect())
}
