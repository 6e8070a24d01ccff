//! The in-memory table every engine reads from.
//!
//! [`Table`] wraps a polars [`DataFrame`] and replaces duck-typed column access
//! with validated lookups that return typed values. Engines never mutate a
//! table; operations that change data (deduplication, imputation) return a
//! new one.

use crate::error::{EdaError, Result};
use crate::utils::{StorageKind, parse_number, storage_kind};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// Cell values
// =============================================================================

/// A single cell, independent of the column's storage type.
///
/// Numbers compare numerically, so `1` and `1.0` are the same value.
/// Integer columns keep their exact `i64` values; a float equals an integer
/// only when it is exactly that integer.
/// `Missing` equals `Missing`, which is what duplicate detection needs;
/// predicates treat missing cells separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Missing,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(v) => Some(*v as f64),
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CellValue::Missing => 0,
            CellValue::Bool(_) => 1,
            CellValue::Integer(_) | CellValue::Number(_) => 2,
            CellValue::Text(_) => 3,
        }
    }

    /// Whether ordering comparisons between the two values are meaningful.
    pub(crate) fn same_kind(&self, other: &CellValue) -> bool {
        self.rank() == other.rank()
    }

    // -0.0 and 0.0 must hash alike since they compare equal.
    fn canonical(v: f64) -> f64 {
        if v == 0.0 { 0.0 } else { v }
    }

    /// `Some(i)` when `v` is exactly the integer `i`.
    fn exact_i64(v: f64) -> Option<i64> {
        // i64::MIN as f64 is exact; the upper bound is exclusive
        let bound = -(i64::MIN as f64);
        (v.fract() == 0.0 && v >= i64::MIN as f64 && v < bound).then(|| v as i64)
    }
}

/// Exact ordering of an integer against a float.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    match (i as f64).total_cmp(&CellValue::canonical(f)) {
        // the rounded integer equals f, so f is integral and fits in i128
        Ordering::Equal => (i as i128).cmp(&(f as i128)),
        other => other,
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Integer(a), CellValue::Integer(b)) => a.cmp(b),
            (CellValue::Integer(a), CellValue::Number(b)) => cmp_int_float(*a, *b),
            (CellValue::Number(a), CellValue::Integer(b)) => cmp_int_float(*b, *a).reverse(),
            (CellValue::Number(a), CellValue::Number(b)) => {
                Self::canonical(*a).total_cmp(&Self::canonical(*b))
            }
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            CellValue::Missing => {}
            CellValue::Bool(b) => b.hash(state),
            CellValue::Integer(v) => v.hash(state),
            // integral floats hash like the integer they equal
            CellValue::Number(v) => match Self::exact_i64(*v) {
                Some(i) => i.hash(state),
                None => v.to_bits().hash(state),
            },
            CellValue::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => write!(f, "missing"),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Integer(v) => write!(f, "{}", v),
            CellValue::Number(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        if v.is_nan() {
            CellValue::Missing
        } else {
            CellValue::Number(v)
        }
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<i32> for CellValue {
    fn from(v: i32) -> Self {
        CellValue::Integer(v.into())
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Missing)
    }
}

// =============================================================================
// Table
// =============================================================================

/// An immutable snapshot of a rectangular dataset.
#[derive(Debug, Clone)]
pub struct Table {
    df: DataFrame,
}

static_assertions::assert_impl_all!(Table: Send, Sync);

impl Table {
    /// Wrap a DataFrame. Polars already guarantees equal column lengths and unique names.
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_dataframe(self) -> DataFrame {
        self.df
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn column_count(&self) -> usize {
        self.df.width()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.df.shape()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    /// Validated lookup of a column's series.
    pub fn series(&self, name: &str) -> Result<&Series> {
        self.df
            .column(name)
            .map(|col| col.as_materialized_series())
            .map_err(|_| EdaError::ColumnNotFound(name.to_string()))
    }

    /// Fail with [`EdaError::EmptyTable`] if the table has no rows.
    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            Err(EdaError::EmptyTable)
        } else {
            Ok(())
        }
    }

    /// All cells of a column as [`CellValue`]s.
    ///
    /// Text columns whose non-missing cells all parse as numbers come back as
    /// numbers, matching how [`Table::numeric_values`] reads them. Integer
    /// columns (other than `UInt64`) come back as exact [`CellValue::Integer`]s.
    pub fn cell_values(&self, name: &str) -> Result<Vec<CellValue>> {
        let series = self.series(name)?;
        match storage_kind(series) {
            StorageKind::Numeric if is_exact_integer_dtype(series.dtype()) => Ok(series
                .cast(&DataType::Int64)?
                .i64()?
                .into_iter()
                .map(CellValue::from)
                .collect()),
            StorageKind::Numeric => Ok(float_values(series)?
                .into_iter()
                .map(CellValue::from)
                .collect()),
            StorageKind::Boolean => Ok(series
                .bool()?
                .into_iter()
                .map(|v| v.map(CellValue::Bool).unwrap_or(CellValue::Missing))
                .collect()),
            StorageKind::Text => {
                let texts = text_values(series)?;
                match parse_all(&texts) {
                    Some(numbers) => Ok(numbers.into_iter().map(CellValue::from).collect()),
                    None => Ok(texts.into_iter().map(CellValue::from).collect()),
                }
            }
        }
    }

    /// Read `raw` as a value of the column's kind, so it can be compared with
    /// the column's cells.
    ///
    /// Numeric columns (including text columns that parse as numbers) need a
    /// number and boolean columns need `true` or `false`; anything else is an
    /// [`EdaError::InvalidParameter`]. Text columns take `raw` as is.
    pub fn parse_cell(&self, name: &str, raw: &str) -> Result<CellValue> {
        let series = self.series(name)?;
        let invalid = |kind: &str| {
            EdaError::invalid_parameter(
                "value",
                format!("'{}' is not a {} value for column '{}'", raw, kind, name),
            )
        };
        let trimmed = raw.trim();
        match storage_kind(series) {
            StorageKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" => Ok(CellValue::Bool(true)),
                "false" => Ok(CellValue::Bool(false)),
                _ => Err(invalid("boolean")),
            },
            _ if self.is_numeric(name)? => match trimmed.parse::<i64>() {
                Ok(v) => Ok(CellValue::Integer(v)),
                Err(_) => parse_number(trimmed)
                    .map(CellValue::Number)
                    .ok_or_else(|| invalid("numeric")),
            },
            _ => Ok(CellValue::Text(raw.to_string())),
        }
    }

    /// Whether every non-missing cell of the column is a number.
    pub fn is_numeric(&self, name: &str) -> Result<bool> {
        let series = self.series(name)?;
        Ok(match storage_kind(series) {
            StorageKind::Numeric => true,
            StorageKind::Boolean => false,
            StorageKind::Text => parse_all(&text_values(series)?).is_some(),
        })
    }

    /// A numeric column's values, `None` where missing.
    ///
    /// Fails with [`EdaError::TypeMismatch`] if any non-missing cell is not a number.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let series = self.series(name)?;
        match storage_kind(series) {
            StorageKind::Numeric => float_values(series),
            StorageKind::Boolean => Err(EdaError::type_mismatch(name, "numeric", "boolean")),
            StorageKind::Text => parse_all(&text_values(series)?)
                .ok_or_else(|| EdaError::type_mismatch(name, "numeric", "text")),
        }
    }

    /// Like [`Table::numeric_values`], but coerces instead of failing:
    /// booleans become 0/1 and unparseable text becomes missing.
    pub fn numeric_values_coerced(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let series = self.series(name)?;
        match storage_kind(series) {
            StorageKind::Numeric => float_values(series),
            StorageKind::Boolean => Ok(series
                .bool()?
                .into_iter()
                .map(|v| v.map(|b| if b { 1.0 } else { 0.0 }))
                .collect()),
            StorageKind::Text => Ok(text_values(series)?
                .iter()
                .map(|v| v.as_deref().and_then(parse_number))
                .collect()),
        }
    }

    /// Materialize the table row by row, in table order.
    pub fn rows(&self) -> Result<Vec<Vec<CellValue>>> {
        let columns = self
            .column_names()
            .iter()
            .map(|name| self.cell_values(name))
            .collect::<Result<Vec<_>>>()?;

        Ok((0..self.row_count())
            .map(|i| columns.iter().map(|col| col[i].clone()).collect())
            .collect())
    }

    /// One row's cells, in column order.
    pub fn row(&self, index: usize) -> Result<Vec<CellValue>> {
        if index >= self.row_count() {
            return Err(EdaError::invalid_parameter(
                "index",
                format!("row {} out of range for {} rows", index, self.row_count()),
            ));
        }
        let slice = Table::new(self.df.slice(index as i64, 1));
        let mut rows = slice.rows()?;
        Ok(rows.pop().unwrap_or_default())
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table::new(self.df.head(Some(n)))
    }

    /// Last `n` rows.
    pub fn tail(&self, n: usize) -> Table {
        Table::new(self.df.tail(Some(n)))
    }

    /// Keep the rows whose mask entry is true, preserving order.
    pub fn filter_rows(&self, keep: &[bool]) -> Result<Table> {
        if keep.len() != self.row_count() {
            return Err(EdaError::invalid_parameter(
                "mask",
                format!("length {} does not match {} rows", keep.len(), self.row_count()),
            ));
        }
        let mask = BooleanChunked::from_slice("mask".into(), keep);
        Ok(Table::new(self.df.filter(&mask)?))
    }

    /// Replace one column with a new series of the same length.
    pub(crate) fn with_replaced(&self, name: &str, series: Series) -> Result<Table> {
        let mut df = self.df.clone();
        df.replace(name, series)?;
        Ok(Table::new(df))
    }
}

impl From<DataFrame> for Table {
    fn from(df: DataFrame) -> Self {
        Table::new(df)
    }
}

// UInt64 may not fit in i64
fn is_exact_integer_dtype(dtype: &DataType) -> bool {
    dtype.is_integer() && !matches!(dtype, DataType::UInt64)
}

fn float_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let casted = series.cast(&DataType::Float64)?;
    Ok(casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

fn text_values(series: &Series) -> Result<Vec<Option<String>>> {
    let casted = series.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Parse every non-missing text cell, or `None` if any cell is not a number.
fn parse_all(texts: &[Option<String>]) -> Option<Vec<Option<f64>>> {
    texts
        .iter()
        .map(|v| match v {
            None => Some(None),
            Some(s) => parse_number(s).map(Some),
        })
        .collect()
}
