// Typed, nullable columns

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;

use crate::error::FrameError;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Int64,
    Int32,
    Float64,
    Str,
    Categorical,
    Date,
}

impl DType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int64 => "int64",
            Self::Int32 => "int32",
            Self::Float64 => "float64",
            Self::Str => "string",
            Self::Categorical => "category",
            Self::Date => "date",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "int64" => Some(Self::Int64),
            "int32" => Some(Self::Int32),
            "float64" => Some(Self::Float64),
            "string" => Some(Self::Str),
            "category" => Some(Self::Categorical),
            "date" => Some(Self::Date),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int64 | Self::Int32 | Self::Float64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell, detached from its column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("<null>"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ColumnData {
    Int64(Vec<Option<i64>>),
    Int32(Vec<Option<i32>>),
    Float64(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
    /// `categories` is sorted and unique; each code indexes into it.
    Categorical { categories: Vec<String>, codes: Vec<Option<u32>> },
    Date(Vec<Option<NaiveDate>>),
}

impl ColumnData {
    pub fn dtype(&self) -> DType {
        match self {
            Self::Int64(_) => DType::Int64,
            Self::Int32(_) => DType::Int32,
            Self::Float64(_) => DType::Float64,
            Self::Str(_) => DType::Str,
            Self::Categorical { .. } => DType::Categorical,
            Self::Date(_) => DType::Date,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Int64(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Str(v) => v.len(),
            Self::Categorical { codes, .. } => codes.len(),
            Self::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty column of the given dtype, `len` nulls long.
    pub fn nulls(dtype: DType, len: usize) -> Self {
        match dtype {
            DType::Int64 => Self::Int64(vec![None; len]),
            DType::Int32 => Self::Int32(vec![None; len]),
            DType::Float64 => Self::Float64(vec![None; len]),
            DType::Str => Self::Str(vec![None; len]),
            DType::Categorical => Self::Categorical { categories: Vec::new(), codes: vec![None; len] },
            DType::Date => Self::Date(vec![None; len]),
        }
    }

    pub fn get(&self, row: usize) -> Value {
        match self {
            Self::Int64(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Int),
            Self::Int32(v) => v
                .get(row)
                .copied()
                .flatten()
                .map_or(Value::Null, |n| Value::Int(n as i64)),
            Self::Float64(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Float),
            Self::Str(v) => v
                .get(row)
                .and_then(|s| s.clone())
                .map_or(Value::Null, Value::Str),
            Self::Categorical { categories, codes } => codes
                .get(row)
                .copied()
                .flatten()
                .and_then(|c| categories.get(c as usize))
                .map_or(Value::Null, |s| Value::Str(s.clone())),
            Self::Date(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Date),
        }
    }

    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.get(i).is_null()).count()
    }

    /// Reorder/subset rows. `None` in `indices` produces a null row.
    pub fn take(&self, indices: &[Option<usize>]) -> Self {
        fn pick<T: Clone>(v: &[Option<T>], indices: &[Option<usize>]) -> Vec<Option<T>> {
            indices
                .iter()
                .map(|i| i.and_then(|i| v.get(i).cloned().flatten()))
                .collect()
        }
        match self {
            Self::Int64(v) => Self::Int64(pick(v, indices)),
            Self::Int32(v) => Self::Int32(pick(v, indices)),
            Self::Float64(v) => Self::Float64(pick(v, indices)),
            Self::Str(v) => Self::Str(pick(v, indices)),
            Self::Categorical { categories, codes } => Self::Categorical {
                categories: categories.clone(),
                codes: pick(codes, indices),
            },
            Self::Date(v) => Self::Date(pick(v, indices)),
        }
    }

    /// Build a categorical from string labels. Categories are the sorted unique labels.
    pub fn categorical_from_labels(labels: &[Option<String>]) -> Self {
        let categories: Vec<String> = labels
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let codes = labels
            .iter()
            .map(|l| {
                l.as_ref()
                    .and_then(|l| categories.binary_search(l).ok())
                    .map(|i| i as u32)
            })
            .collect();
        Self::Categorical { categories, codes }
    }
}

/// A named column.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self { name: name.into(), data }
    }

    pub fn int64(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        Self::new(name, ColumnData::Int64(values))
    }

    pub fn int32(name: impl Into<String>, values: Vec<Option<i32>>) -> Self {
        Self::new(name, ColumnData::Int32(values))
    }

    pub fn float64(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Float64(values))
    }

    pub fn str(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Str(values))
    }

    pub fn date(name: impl Into<String>, values: Vec<Option<NaiveDate>>) -> Self {
        Self::new(name, ColumnData::Date(values))
    }

    pub fn categorical(name: impl Into<String>, labels: &[Option<String>]) -> Self {
        Self::new(name, ColumnData::categorical_from_labels(labels))
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize) -> Value {
        self.data.get(row)
    }

    fn mismatch(&self, expected: DType) -> FrameError {
        FrameError::DTypeMismatch {
            column: self.name.clone(),
            expected,
            found: self.dtype(),
        }
    }

    pub fn as_int64(&self) -> Result<&[Option<i64>], FrameError> {
        match &self.data {
            ColumnData::Int64(v) => Ok(v),
            _ => Err(self.mismatch(DType::Int64)),
        }
    }

    pub fn as_int32(&self) -> Result<&[Option<i32>], FrameError> {
        match &self.data {
            ColumnData::Int32(v) => Ok(v),
            _ => Err(self.mismatch(DType::Int32)),
        }
    }

    pub fn as_float64(&self) -> Result<&[Option<f64>], FrameError> {
        match &self.data {
            ColumnData::Float64(v) => Ok(v),
            _ => Err(self.mismatch(DType::Float64)),
        }
    }

    pub fn as_str(&self) -> Result<&[Option<String>], FrameError> {
        match &self.data {
            ColumnData::Str(v) => Ok(v),
            _ => Err(self.mismatch(DType::Str)),
        }
    }

    pub fn as_date(&self) -> Result<&[Option<NaiveDate>], FrameError> {
        match &self.data {
            ColumnData::Date(v) => Ok(v),
            _ => Err(self.mismatch(DType::Date)),
        }
    }

    /// Replace nulls with `value`. Integer columns only accept `Value::Int`,
    /// float columns accept `Int` or `Float`, string columns accept `Str`.
    pub fn fill_null(&mut self, value: &Value) -> Result<(), FrameError> {
        let name = self.name.clone();
        let unsupported = |dtype: DType| FrameError::Cast {
            column: name.clone(),
            value: value.to_string(),
            from: dtype,
            to: dtype,
        };
        let dtype = self.dtype();
        match (&mut self.data, value) {
            (ColumnData::Int64(v), Value::Int(n)) => fill(v, *n),
            (ColumnData::Int32(v), Value::Int(n)) => {
                let n = i32::try_from(*n).map_err(|_| unsupported(dtype))?;
                fill(v, n)
            }
            (ColumnData::Float64(v), Value::Int(n)) => fill(v, *n as f64),
            (ColumnData::Float64(v), Value::Float(x)) => fill(v, *x),
            (ColumnData::Str(v), Value::Str(s)) => {
                for cell in v.iter_mut().filter(|c| c.is_none()) {
                    *cell = Some(s.clone());
                }
            }
            (ColumnData::Date(v), Value::Date(d)) => fill(v, *d),
            _ => return Err(unsupported(dtype)),
        }
        Ok(())
    }

    /// Convert to another dtype.
    ///
    /// Float to integer truncates toward zero; integer narrowing is checked.
    /// String to categorical derives sorted categories from the values.
    pub fn cast(&self, to: DType) -> Result<Column, FrameError> {
        let from = self.dtype();
        if from == to {
            return Ok(self.clone());
        }
        let cast_err = |value: String| FrameError::Cast {
            column: self.name.clone(),
            value,
            from,
            to,
        };

        let data = match (&self.data, to) {
            (ColumnData::Int64(v), DType::Int32) => ColumnData::Int32(
                v.iter()
                    .map(|c| c.map(|n| i32::try_from(n).map_err(|_| cast_err(n.to_string()))).transpose())
                    .collect::<Result<_, _>>()?,
            ),
            (ColumnData::Int64(v), DType::Float64) => {
                ColumnData::Float64(v.iter().map(|c| c.map(|n| n as f64)).collect())
            }
            (ColumnData::Int32(v), DType::Int64) => {
                ColumnData::Int64(v.iter().map(|c| c.map(i64::from)).collect())
            }
            (ColumnData::Int32(v), DType::Float64) => {
                ColumnData::Float64(v.iter().map(|c| c.map(f64::from)).collect())
            }
            (ColumnData::Float64(v), DType::Int64) => ColumnData::Int64(
                v.iter()
                    .map(|c| c.map(|x| truncate_i64(x).ok_or_else(|| cast_err(x.to_string()))).transpose())
                    .collect::<Result<_, _>>()?,
            ),
            (ColumnData::Float64(v), DType::Int32) => ColumnData::Int32(
                v.iter()
                    .map(|c| {
                        c.map(|x| {
                            truncate_i64(x)
                                .and_then(|n| i32::try_from(n).ok())
                                .ok_or_else(|| cast_err(x.to_string()))
                        })
                        .transpose()
                    })
                    .collect::<Result<_, _>>()?,
            ),
            (ColumnData::Str(v), DType::Int64) => ColumnData::Int64(
                v.iter()
                    .map(|c| {
                        c.as_ref()
                            .map(|s| parse_int(s).ok_or_else(|| cast_err(s.clone())))
                            .transpose()
                    })
                    .collect::<Result<_, _>>()?,
            ),
            (ColumnData::Str(v), DType::Int32) => ColumnData::Int32(
                v.iter()
                    .map(|c| {
                        c.as_ref()
                            .map(|s| {
                                parse_int(s)
                                    .and_then(|n| i32::try_from(n).ok())
                                    .ok_or_else(|| cast_err(s.clone()))
                            })
                            .transpose()
                    })
                    .collect::<Result<_, _>>()?,
            ),
            (ColumnData::Str(v), DType::Float64) => ColumnData::Float64(
                v.iter()
                    .map(|c| {
                        c.as_ref()
                            .map(|s| s.trim().parse::<f64>().map_err(|_| cast_err(s.clone())))
                            .transpose()
                    })
                    .collect::<Result<_, _>>()?,
            ),
            (ColumnData::Str(v), DType::Categorical) => ColumnData::categorical_from_labels(v),
            (ColumnData::Str(v), DType::Date) => ColumnData::Date(
                v.iter()
                    .map(|c| {
                        c.as_ref()
                            .map(|s| {
                                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                                    .map_err(|_| cast_err(s.clone()))
                            })
                            .transpose()
                    })
                    .collect::<Result<_, _>>()?,
            ),
            (data, DType::Str) => ColumnData::Str(
                (0..data.len())
                    .map(|i| match data.get(i) {
                        Value::Null => None,
                        v => Some(v.to_string()),
                    })
                    .collect(),
            ),
            (data, DType::Categorical) => {
                let labels: Vec<Option<String>> = (0..data.len())
                    .map(|i| match data.get(i) {
                        Value::Null => None,
                        v => Some(v.to_string()),
                    })
                    .collect();
                ColumnData::categorical_from_labels(&labels)
            }
            (ColumnData::Categorical { .. }, _) => {
                // Route through the labels.
                return self.cast(DType::Str)?.cast(to);
            }
            _ => {
                return Err(FrameError::UnsupportedCast {
                    column: self.name.clone(),
                    from,
                    to,
                })
            }
        };

        Ok(Column { name: self.name.clone(), data })
    }
}

fn fill<T: Copy>(v: &mut [Option<T>], with: T) {
    for cell in v.iter_mut().filter(|c| c.is_none()) {
        *cell = Some(with);
    }
}

fn truncate_i64(x: f64) -> Option<i64> {
    if !x.is_finite() {
        return None;
    }
    let t = x.trunc();
    if t < i64::MIN as f64 || t > i64::MAX as f64 {
        return None;
    }
    Some(t as i64)
}

/// Integer parse that also accepts integral floats (`"12.0"`), as spreadsheet
/// and text exports often write them.
fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    let x = s.parse::<f64>().ok()?;
    if x.fract() == 0.0 {
        truncate_i64(x)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn categorical_categories_are_sorted_unique() {
        let col = Column::categorical("state", &[s("NY"), s("CA"), None, s("NY")]);
        match &col.data {
            ColumnData::Categorical { categories, codes } => {
                assert_eq!(categories, &["CA", "NY"]);
                assert_eq!(codes, &[Some(1), Some(0), None, Some(1)]);
            }
            other => panic!("expected categorical, got {:?}", other.dtype()),
        }
        assert_eq!(col.get(0), Value::Str("NY".into()));
        assert_eq!(col.get(2), Value::Null);
    }

    #[test]
    fn int64_to_int32_is_checked() {
        let ok = Column::int64("n", vec![Some(5), None]).cast(DType::Int32).unwrap();
        assert_eq!(ok.as_int32().unwrap(), &[Some(5), None]);

        let err = Column::int64("n", vec![Some(i64::from(i32::MAX) + 1)])
            .cast(DType::Int32)
            .unwrap_err();
        assert!(matches!(err, FrameError::Cast { .. }));
    }

    #[test]
    fn float_to_int_truncates() {
        let col = Column::float64("book", vec![Some(12.9), Some(-3.5), None])
            .cast(DType::Int32)
            .unwrap();
        assert_eq!(col.as_int32().unwrap(), &[Some(12), Some(-3), None]);
    }

    #[test]
    fn float_nan_does_not_cast_to_int() {
        let err = Column::float64("x", vec![Some(f64::NAN)]).cast(DType::Int64).unwrap_err();
        assert!(err.to_string().contains("cannot cast"));
    }

    #[test]
    fn str_to_int_accepts_integral_floats() {
        let col = Column::str("acctnum", vec![s(" 10001 "), s("10002.0"), None])
            .cast(DType::Int64)
            .unwrap();
        assert_eq!(col.as_int64().unwrap(), &[Some(10001), Some(10002), None]);

        assert!(Column::str("acctnum", vec![s("10.5")]).cast(DType::Int64).is_err());
    }

    #[test]
    fn int_to_str_and_back() {
        let col = Column::int64("acctnum", vec![Some(42), None]).cast(DType::Str).unwrap();
        assert_eq!(col.as_str().unwrap(), &[s("42"), None]);
    }

    #[test]
    fn categorical_to_int_goes_through_labels() {
        let col = Column::categorical("training", &[s("1"), s("0")]).cast(DType::Int32).unwrap();
        assert_eq!(col.as_int32().unwrap(), &[Some(1), Some(0)]);
    }

    #[test]
    fn date_to_int_is_unsupported() {
        let d = NaiveDate::from_ymd_opt(2009, 1, 1);
        let err = Column::date("date", vec![d]).cast(DType::Int64).unwrap_err();
        assert!(matches!(err, FrameError::UnsupportedCast { .. }));
    }

    #[test]
    fn fill_null_ints() {
        let mut col = Column::int32("child", vec![None, Some(2)]);
        col.fill_null(&Value::Int(0)).unwrap();
        assert_eq!(col.as_int32().unwrap(), &[Some(0), Some(2)]);
    }

    #[test]
    fn fill_null_rejects_wrong_value_kind() {
        let mut col = Column::int64("child", vec![None]);
        assert!(col.fill_null(&Value::Str("x".into())).is_err());
    }

    #[test]
    fn take_with_missing_rows() {
        let data = ColumnData::Int64(vec![Some(1), Some(2), Some(3)]);
        let taken = data.take(&[Some(2), None, Some(0)]);
        match taken {
            ColumnData::Int64(v) => assert_eq!(v, vec![Some(3), None, Some(1)]),
            other => panic!("unexpected {:?}", other.dtype()),
        }
    }

    #[test]
    fn dtype_names_roundtrip() {
        for dt in [DType::Int64, DType::Int32, DType::Float64, DType::Str, DType::Categorical, DType::Date] {
            assert_eq!(DType::parse(dt.as_str()), Some(dt));
        }
        assert_eq!(DType::Str.as_str(), "string");
        assert_eq!(DType::Categorical.as_str(), "category");
        assert_eq!(DType::parse("str"), None);
        assert_eq!(DType::parse("categorical"), None);
    }
}
