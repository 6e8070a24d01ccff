//! Report value types shared by the engines.
//!
//! All of these are derived views: computed fresh from a [`crate::Table`],
//! never cached, and safe to hand to a renderer.

use crate::table::CellValue;
use crate::utils::nan_as_null;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Schema
// ============================================================================

/// Domain meaning of a column, independent of how it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// Continuous numbers.
    Numeric,
    /// Integral numbers with few distinct values (e.g. quality scores).
    /// Summarized like numeric columns and also given a frequency table.
    Discrete,
    /// Labels drawn from a small set.
    Categorical,
    /// One distinct value per row (ids, names).
    Identifier,
}

impl SemanticType {
    pub fn is_numeric(self) -> bool {
        matches!(self, SemanticType::Numeric | SemanticType::Discrete)
    }

    /// Whether a frequency table is meaningful for this column.
    pub fn has_frequencies(self) -> bool {
        matches!(self, SemanticType::Discrete | SemanticType::Categorical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SemanticType::Numeric => "numeric",
            SemanticType::Discrete => "discrete",
            SemanticType::Categorical => "categorical",
            SemanticType::Identifier => "identifier",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification result for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub semantic_type: SemanticType,
    pub null_count: usize,
    /// Distinct non-missing values.
    pub unique_count: usize,
}

// ============================================================================
// Quality
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingStats {
    pub column: String,
    pub count: usize,
    /// `count / row_count`
    pub ratio: f64,
}

/// Missing-value counts per column, in table column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingReport {
    pub row_count: usize,
    pub columns: Vec<MissingStats>,
}

impl MissingReport {
    pub fn get(&self, column: &str) -> Option<&MissingStats> {
        self.columns.iter().find(|stats| stats.column == column)
    }

    /// Columns with at least one missing value.
    pub fn columns_with_missing(&self) -> Vec<&MissingStats> {
        self.columns.iter().filter(|stats| stats.count > 0).collect()
    }

    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|stats| stats.count).sum()
    }
}

/// Rows that repeat an earlier row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub count: usize,
    /// Indices of the repeating rows, ascending. First occurrences are never listed.
    pub rows: Vec<usize>,
}

// ============================================================================
// Descriptive statistics
// ============================================================================

/// Summary of a numeric column's non-missing values.
///
/// With `count == 0` every other field is NaN; with `count == 1`, `std` is NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    #[serde(deserialize_with = "nan_as_null::scalar")]
    pub mean: f64,
    #[serde(deserialize_with = "nan_as_null::scalar")]
    pub std: f64,
    #[serde(deserialize_with = "nan_as_null::scalar")]
    pub min: f64,
    #[serde(rename = "25%", deserialize_with = "nan_as_null::scalar")]
    pub q1: f64,
    #[serde(rename = "50%", deserialize_with = "nan_as_null::scalar")]
    pub median: f64,
    #[serde(rename = "75%", deserialize_with = "nan_as_null::scalar")]
    pub q3: f64,
    #[serde(deserialize_with = "nan_as_null::scalar")]
    pub max: f64,
}

impl SummaryStats {
    /// Interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub value: CellValue,
    pub count: usize,
}

/// Occurrence counts of each distinct value, most frequent first.
///
/// Ties keep the order in which values first appear. Missing cells are
/// counted under [`CellValue::Missing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub column: String,
    pub entries: Vec<FrequencyEntry>,
}

impl FrequencyTable {
    pub fn get(&self, value: &CellValue) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| &entry.value == value)
            .map(|entry| entry.count)
    }

    /// Sum of all counts; equals the table's row count.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// Most frequent non-missing value.
    pub fn mode(&self) -> Option<&CellValue> {
        self.entries
            .iter()
            .find(|entry| !entry.value.is_missing())
            .map(|entry| &entry.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One equal-width histogram bin, `[start, end)` except the last which is closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

// ============================================================================
// Aggregates
// ============================================================================

/// One row selected by a top-N query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedValue {
    /// Row index in the source table (0-based).
    pub row: usize,
    pub value: f64,
}

/// Grouping key; one value per grouping column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey(pub Vec<CellValue>);

impl GroupKey {
    /// Key of an ungrouped query.
    pub fn empty() -> Self {
        GroupKey(Vec::new())
    }

    pub fn single(value: impl Into<CellValue>) -> Self {
        GroupKey(vec![value.into()])
    }

    pub fn values(&self) -> &[CellValue] {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => f.write_str("(all)"),
            [single] => write!(f, "{}", single),
            many => {
                let parts: Vec<String> = many.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_type_flags() {
        assert!(SemanticType::Discrete.is_numeric());
        assert!(SemanticType::Discrete.has_frequencies());
        assert!(!SemanticType::Identifier.is_numeric());
        assert!(!SemanticType::Numeric.has_frequencies());
    }

    #[test]
    fn test_semantic_type_serialization() {
        let json = serde_json::to_string(&SemanticType::Categorical).unwrap();
        assert_eq!(json, "\"categorical\"");
    }

    #[test]
    fn test_summary_stats_nan_round_trip() {
        let stats = SummaryStats {
            count: 1,
            mean: 7.25,
            std: f64::NAN,
            min: 7.25,
            q1: 7.25,
            median: 7.25,
            q3: 7.25,
            max: 7.25,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"std\":null"));

        let back: SummaryStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back.count, 1);
        assert_eq!(back.median, 7.25);
        assert!(back.std.is_nan());
    }

    #[test]
    fn test_frequency_table_helpers() {
        let table = FrequencyTable {
            column: "Embarked".to_string(),
            entries: vec![
                FrequencyEntry { value: CellValue::Missing, count: 3 },
                FrequencyEntry { value: CellValue::from("S"), count: 2 },
                FrequencyEntry { value: CellValue::from("C"), count: 1 },
            ],
        };
        assert_eq!(table.total(), 6);
        assert_eq!(table.get(&CellValue::from("S")), Some(2));
        assert_eq!(table.get(&CellValue::from("Q")), None);
        assert_eq!(table.mode(), Some(&CellValue::from("S")));
    }

    #[test]
    fn test_missing_report_helpers() {
        let report = MissingReport {
            row_count: 4,
            columns: vec![
                MissingStats { column: "Age".to_string(), count: 1, ratio: 0.25 },
                MissingStats { column: "Fare".to_string(), count: 0, ratio: 0.0 },
            ],
        };
        assert_eq!(report.total_missing(), 1);
        assert_eq!(report.columns_with_missing().len(), 1);
        assert_eq!(report.get("Fare").map(|s| s.count), Some(0));
    }

    #[test]
    fn test_summary_stats_serializes_percentile_names() {
        let stats = SummaryStats {
            count: 1,
            mean: 1.0,
            std: f64::NAN,
            min: 1.0,
            q1: 1.0,
            median: 1.0,
            q3: 1.0,
            max: 1.0,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"50%\""));
        assert!((stats.iqr()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_group_key_display() {
        assert_eq!(GroupKey::empty().to_string(), "(all)");
        assert_eq!(GroupKey::single("female").to_string(), "female");
        let key = GroupKey(vec![CellValue::from(1i64), CellValue::from("S")]);
        assert_eq!(key.to_string(), "(1, S)");
    }
}
