//! Grouped aggregate engine.
//!
//! Filtering, grouping and reduction are one query:
//!
//! ```rust,ignore
//! let query = AggregateQuery::new("Survived", AggFn::Mean)
//!     .group_by(["Sex", "Pclass"])
//!     .filter(Predicate::not_missing("Age"));
//! let survival = AggregateEngine::aggregate(&table, &query)?;
//! ```
//!
//! Rows whose grouping key contains a missing value are dropped. Missing
//! target values are skipped inside a group; a group with no present target
//! values yields NaN for `Mean`/`Median` and 0 for `Sum`/`Count`.

mod predicate;

pub use predicate::{CompareOp, Predicate};

use crate::error::{EdaError, Result};
use crate::stats::summary;
use crate::table::{CellValue, Table};
use crate::types::{GroupKey, RankedValue, SummaryStats};
use crate::utils::round_to;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Reduction applied to each group's target values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggFn {
    Mean,
    Sum,
    Count,
    Median,
}

impl AggFn {
    fn needs_numeric(self) -> bool {
        !matches!(self, AggFn::Count)
    }

    fn apply(self, values: &[f64]) -> f64 {
        match self {
            AggFn::Mean => summary::mean(values),
            AggFn::Sum => values.iter().sum(),
            AggFn::Count => values.len() as f64,
            AggFn::Median => summary::median(values),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateQuery {
    pub target: String,
    pub func: AggFn,
    pub group_by: Vec<String>,
    pub filter: Option<Predicate>,
}

impl AggregateQuery {
    pub fn new(target: impl Into<String>, func: AggFn) -> Self {
        Self {
            target: target.into(),
            func,
            group_by: Vec::new(),
            filter: None,
        }
    }

    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(predicate);
        self
    }
}

/// One value per non-empty group, ordered by key.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub groups: BTreeMap<GroupKey, f64>,
}

impl AggregateResult {
    /// The single value of an ungrouped query; `None` if the filter left no rows.
    pub fn scalar(&self) -> Option<f64> {
        self.groups.get(&GroupKey::empty()).copied()
    }

    pub fn get(&self, key: &GroupKey) -> Option<f64> {
        self.groups.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Grouped aggregates, ranking and proportions.
pub struct AggregateEngine;

impl AggregateEngine {
    /// Run an aggregate query.
    pub fn aggregate(table: &Table, query: &AggregateQuery) -> Result<AggregateResult> {
        table.ensure_not_empty()?;

        let mask = match &query.filter {
            Some(predicate) => predicate.mask(table)?,
            None => vec![true; table.row_count()],
        };
        let target: Vec<Option<f64>> = if query.func.needs_numeric() {
            table.numeric_values(&query.target)?
        } else {
            // Count only needs presence; any column type is accepted.
            table
                .cell_values(&query.target)?
                .iter()
                .map(|v| (!v.is_missing()).then_some(1.0))
                .collect()
        };

        let partitions = Self::partition(table, &query.group_by, &mask)?;
        let groups: BTreeMap<GroupKey, f64> = partitions
            .into_iter()
            .map(|(key, rows)| {
                let present: Vec<f64> = rows.iter().filter_map(|&row| target[row]).collect();
                (key, query.func.apply(&present))
            })
            .collect();

        debug!(
            "Aggregate {:?}({}) by {:?}: {} group(s)",
            query.func,
            query.target,
            query.group_by,
            groups.len()
        );
        Ok(AggregateResult { groups })
    }

    /// Row indices per group key, for rows that pass `mask` and have a complete key.
    fn partition(
        table: &Table,
        group_by: &[String],
        mask: &[bool],
    ) -> Result<BTreeMap<GroupKey, Vec<usize>>> {
        let key_columns = group_by
            .iter()
            .map(|name| table.cell_values(name))
            .collect::<Result<Vec<Vec<CellValue>>>>()?;

        let mut partitions: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
        for row in (0..table.row_count()).filter(|&row| mask[row]) {
            let key: Vec<CellValue> = key_columns.iter().map(|col| col[row].clone()).collect();
            if key.iter().any(CellValue::is_missing) {
                continue;
            }
            partitions.entry(GroupKey(key)).or_default().push(row);
        }
        Ok(partitions)
    }

    /// The `n` largest (or smallest, with `ascending`) values of a numeric column.
    ///
    /// Missing values are skipped; equal values keep table order.
    pub fn top_n(table: &Table, column: &str, n: i64, ascending: bool) -> Result<Vec<RankedValue>> {
        table.ensure_not_empty()?;
        if n < 0 {
            return Err(EdaError::invalid_parameter(
                "n",
                format!("must be non-negative, got {}", n),
            ));
        }
        if !table.is_numeric(column)? {
            return Err(EdaError::invalid_parameter(
                "column",
                format!("'{}' is not numeric", column),
            ));
        }

        let mut ranked: Vec<RankedValue> = table
            .numeric_values(column)?
            .into_iter()
            .enumerate()
            .filter_map(|(row, value)| value.map(|value| RankedValue { row, value }))
            .collect();
        if ascending {
            ranked.sort_by(|a, b| a.value.total_cmp(&b.value));
        } else {
            ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
        }
        ranked.truncate(usize::try_from(n).unwrap_or(usize::MAX));
        Ok(ranked)
    }

    /// Share of non-missing cells equal to `value`, rounded to `precision` decimals.
    ///
    /// `value` must not be missing; use [`QualityAnalyzer::missing_report`] for that ratio.
    ///
    /// [`QualityAnalyzer::missing_report`]: crate::QualityAnalyzer::missing_report
    pub fn proportion(
        table: &Table,
        column: &str,
        value: impl Into<CellValue>,
        precision: u32,
    ) -> Result<f64> {
        table.ensure_not_empty()?;
        let value = value.into();
        if value.is_missing() {
            return Err(EdaError::invalid_parameter(
                "value",
                "cannot be missing; the denominator only counts present cells",
            ));
        }
        let cells = table.cell_values(column)?;
        if cells.iter().all(CellValue::is_missing) {
            return Err(EdaError::NoValidValues(column.to_string()));
        }

        let present = cells.iter().filter(|cell| !cell.is_missing()).count();
        let matches = cells.iter().filter(|cell| **cell == value).count();
        Ok(round_to(matches as f64 / present as f64, precision))
    }

    /// Number of rows matching a predicate.
    pub fn count_where(table: &Table, predicate: &Predicate) -> Result<usize> {
        Ok(predicate.mask(table)?.into_iter().filter(|&m| m).count())
    }

    /// Summary statistics of a numeric target within each group.
    pub fn describe_by_group(
        table: &Table,
        group_by: &[&str],
        target: &str,
    ) -> Result<BTreeMap<GroupKey, SummaryStats>> {
        table.ensure_not_empty()?;
        let values = table.numeric_values(target)?;
        let group_by: Vec<String> = group_by.iter().map(|c| c.to_string()).collect();
        let mask = vec![true; table.row_count()];

        Ok(Self::partition(table, &group_by, &mask)?
            .into_iter()
            .map(|(key, rows)| {
                let present: Vec<f64> = rows.iter().filter_map(|&row| values[row]).collect();
                (key, summary::summarize(&present))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn titanic() -> Table {
        Table::new(
            df![
                "Survived" => [0i64, 1, 1, 1, 0, 0],
                "Pclass" => [3i64, 1, 3, 1, 3, 3],
                "Sex" => ["male", "female", "female", "female", "male", "male"],
                "Age" => [Some(22.0), Some(38.0), Some(26.0), Some(35.0), Some(35.0), None],
                "Fare" => [7.25, 71.28, 7.92, 53.1, 8.05, 8.46],
                "Embarked" => [Some("S"), Some("C"), Some("S"), Some("S"), Some("S"), None],
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_grouped_mean() {
        let query = AggregateQuery::new("Survived", AggFn::Mean).group_by(["Sex"]);
        let result = AggregateEngine::aggregate(&titanic(), &query).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.get(&GroupKey::single("female")), Some(1.0));
        assert_eq!(result.get(&GroupKey::single("male")), Some(0.0));
        // keys are ordered
        let keys: Vec<String> = result.groups.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["female", "male"]);
    }

    #[test]
    fn test_composite_key() {
        let query = AggregateQuery::new("Fare", AggFn::Sum).group_by(["Pclass", "Sex"]);
        let result = AggregateEngine::aggregate(&titanic(), &query).unwrap();
        assert_eq!(result.len(), 3);
        let key = GroupKey(vec![CellValue::from(1i64), CellValue::from("female")]);
        assert!((result.get(&key).unwrap() - 124.38).abs() < 1e-9);
        let key = GroupKey(vec![CellValue::from(3i64), CellValue::from("male")]);
        assert!((result.get(&key).unwrap() - 23.76).abs() < 1e-9);
    }

    #[test]
    fn test_missing_group_key_dropped() {
        let query = AggregateQuery::new("Fare", AggFn::Count).group_by(["Embarked"]);
        let result = AggregateEngine::aggregate(&titanic(), &query).unwrap();
        assert_eq!(result.get(&GroupKey::single("S")), Some(4.0));
        assert_eq!(result.get(&GroupKey::single("C")), Some(1.0));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_filtered_scalar() {
        let query = AggregateQuery::new("Survived", AggFn::Count).filter(
            Predicate::eq("Survived", 1).and(Predicate::eq("Embarked", "S")),
        );
        let result = AggregateEngine::aggregate(&titanic(), &query).unwrap();
        assert_eq!(result.scalar(), Some(2.0));
        assert_eq!(
            AggregateEngine::count_where(
                &titanic(),
                &Predicate::eq("Survived", 1).and(Predicate::eq("Embarked", "S"))
            )
            .unwrap(),
            2
        );
    }

    #[test]
    fn test_filter_excluding_everything_is_empty() {
        let query = AggregateQuery::new("Fare", AggFn::Mean)
            .group_by(["Sex"])
            .filter(Predicate::gt("Age", 100));
        let result = AggregateEngine::aggregate(&titanic(), &query).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.scalar(), None);
    }

    #[test]
    fn test_all_missing_target_in_group() {
        let table = Table::new(
            df![
                "g" => ["a", "a", "b"],
                "x" => [Some(1.0), Some(3.0), None],
            ]
            .unwrap(),
        );
        let mean = AggregateEngine::aggregate(
            &table,
            &AggregateQuery::new("x", AggFn::Mean).group_by(["g"]),
        )
        .unwrap();
        assert_eq!(mean.get(&GroupKey::single("a")), Some(2.0));
        assert!(mean.get(&GroupKey::single("b")).unwrap().is_nan());

        let sum = AggregateEngine::aggregate(
            &table,
            &AggregateQuery::new("x", AggFn::Sum).group_by(["g"]),
        )
        .unwrap();
        assert_eq!(sum.get(&GroupKey::single("b")), Some(0.0));
    }

    #[test]
    fn test_mean_of_text_fails() {
        let query = AggregateQuery::new("Sex", AggFn::Mean);
        assert!(matches!(
            AggregateEngine::aggregate(&titanic(), &query),
            Err(EdaError::TypeMismatch { .. })
        ));
        // counting text is fine
        let query = AggregateQuery::new("Embarked", AggFn::Count);
        let result = AggregateEngine::aggregate(&titanic(), &query).unwrap();
        assert_eq!(result.scalar(), Some(5.0));
    }

    #[test]
    fn test_median_by_group() {
        let query = AggregateQuery::new("Age", AggFn::Median).group_by(["Pclass"]);
        let result = AggregateEngine::aggregate(&titanic(), &query).unwrap();
        assert_eq!(result.get(&GroupKey::single(1i64)), Some(36.5));
        assert_eq!(result.get(&GroupKey::single(3i64)), Some(26.0));
    }

    #[test]
    fn test_top_n() {
        let table = Table::new(df!["Fare" => [7.25, 71.28, 7.92, 53.1, 8.05]].unwrap());
        let top = AggregateEngine::top_n(&table, "Fare", 2, false).unwrap();
        assert_eq!(
            top,
            vec![
                RankedValue { row: 1, value: 71.28 },
                RankedValue { row: 3, value: 53.1 },
            ]
        );

        let bottom = AggregateEngine::top_n(&table, "Fare", 1, true).unwrap();
        assert_eq!(bottom, vec![RankedValue { row: 0, value: 7.25 }]);

        assert!(AggregateEngine::top_n(&table, "Fare", 0, false).unwrap().is_empty());
        assert_eq!(AggregateEngine::top_n(&table, "Fare", 50, false).unwrap().len(), 5);
    }

    #[test]
    fn test_top_n_invalid() {
        let table = titanic();
        assert!(matches!(
            AggregateEngine::top_n(&table, "Fare", -1, false),
            Err(EdaError::InvalidParameter { .. })
        ));
        assert!(matches!(
            AggregateEngine::top_n(&table, "Sex", 3, false),
            Err(EdaError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_top_n_skips_missing() {
        let top = AggregateEngine::top_n(&titanic(), "Age", 10, true).unwrap();
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].value, 22.0);
        // two 35.0 ages keep table order
        assert_eq!((top[2].row, top[3].row), (3, 4));
    }

    #[test]
    fn test_proportion() {
        let table = Table::new(df!["Survived" => [1i64, 0, 1, 1, 0]].unwrap());
        assert_eq!(AggregateEngine::proportion(&table, "Survived", 1, 2).unwrap(), 0.6);

        let table = Table::new(df!["Sex" => ["male", "female", "female"]].unwrap());
        assert_eq!(AggregateEngine::proportion(&table, "Sex", "female", 2).unwrap(), 0.67);
        assert_eq!(AggregateEngine::proportion(&table, "Sex", "other", 2).unwrap(), 0.0);

        // missing cells are not part of the denominator
        let table = Table::new(df!["Embarked" => [Some("S"), None, Some("C"), Some("S")]].unwrap());
        assert_eq!(AggregateEngine::proportion(&table, "Embarked", "S", 2).unwrap(), 0.67);
    }

    #[test]
    fn test_proportion_errors() {
        let empty = Table::new(df!["x" => Vec::<i64>::new()].unwrap());
        assert!(matches!(
            AggregateEngine::proportion(&empty, "x", 1, 2),
            Err(EdaError::EmptyTable)
        ));
        let missing = Table::new(df!["x" => [None::<f64>, None]].unwrap());
        assert!(matches!(
            AggregateEngine::proportion(&missing, "x", 1, 2),
            Err(EdaError::NoValidValues(_))
        ));
    }

    #[test]
    fn test_proportion_of_missing_value_rejected() {
        let table = Table::new(df!["Embarked" => [Some("S"), None, None, None]].unwrap());
        assert!(matches!(
            AggregateEngine::proportion(&table, "Embarked", CellValue::Missing, 2),
            Err(EdaError::InvalidParameter { .. })
        ));
        assert_eq!(AggregateEngine::proportion(&table, "Embarked", "S", 2).unwrap(), 1.0);
    }

    #[test]
    fn test_top_n_empty_table() {
        let empty = Table::new(df!["q" => Vec::<i64>::new()].unwrap());
        assert!(matches!(
            AggregateEngine::top_n(&empty, "q", 3, false),
            Err(EdaError::EmptyTable)
        ));
    }

    #[test]
    fn test_describe_by_group() {
        let groups = AggregateEngine::describe_by_group(&titanic(), &["Sex"], "Age").unwrap();
        let male = &groups[&GroupKey::single("male")];
        // one male passenger has no age
        assert_eq!(male.count, 2);
        assert_eq!(male.median, 28.5);
        let female = &groups[&GroupKey::single("female")];
        assert_eq!(female.count, 3);
        assert_eq!(female.min, 26.0);
        assert_eq!(female.max, 38.0);
    }
}
