//! Shared helpers for dtype inspection and number handling.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// How a column is physically stored, before any semantic classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Integer or floating point numbers
    Numeric,
    /// Boolean type
    Boolean,
    /// Strings and everything else (read through a string cast)
    Text,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is boolean.
#[inline]
pub fn is_boolean_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Boolean)
}

/// Get the storage kind of a Series.
pub fn storage_kind(series: &Series) -> StorageKind {
    let dtype = series.dtype();
    if is_numeric_dtype(dtype) {
        StorageKind::Numeric
    } else if is_boolean_dtype(dtype) {
        StorageKind::Boolean
    } else {
        StorageKind::Text
    }
}

// =============================================================================
// Number Utilities
// =============================================================================

/// Parse a text cell as a number. Surrounding whitespace is ignored; NaN is rejected.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Whether a value has no fractional part.
#[inline]
pub fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

/// `deserialize_with` helpers for report fields that may hold NaN.
///
/// serde_json writes a non-finite `f64` as `null`; these read it back as NaN.
pub(crate) mod nan_as_null {
    use serde::{Deserialize, Deserializer};

    pub fn scalar<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }

    pub fn matrix<'de, D>(deserializer: D) -> Result<Vec<Vec<f64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rows = Vec::<Vec<Option<f64>>>::deserialize(deserializer)?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float32));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_storage_kind() {
        let s = Series::new("a".into(), &[1i64, 2, 3]);
        assert_eq!(storage_kind(&s), StorageKind::Numeric);
        let s = Series::new("b".into(), &[true, false]);
        assert_eq!(storage_kind(&s), StorageKind::Boolean);
        let s = Series::new("c".into(), &["x", "y"]);
        assert_eq!(storage_kind(&s), StorageKind::Text);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 7.25 "), Some(7.25));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("S"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.6, 2), 0.6);
        assert_eq!(round_to(0.383838, 2), 0.38);
        assert_eq!(round_to(14.454208, 4), 14.4542);
    }

    #[test]
    fn test_is_integral() {
        assert!(is_integral(5.0));
        assert!(!is_integral(5.5));
        assert!(!is_integral(f64::INFINITY));
    }
}
