//! Row filters for aggregate queries.

use crate::error::Result;
use crate::table::{CellValue, Table};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A boolean condition over a row's cells.
///
/// A comparison with a missing cell is false, whatever the operator; use
/// [`Predicate::is_missing`] to select missing cells. Ordering comparisons
/// between different kinds of value (number vs text) are false as well.
///
/// ```rust,ignore
/// let women_first_class = Predicate::eq("Sex", "female").and(Predicate::eq("Pclass", 1));
/// let teenagers = Predicate::gt("Age", 12).and(Predicate::le("Age", 19));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Compare {
        column: String,
        op: CompareOp,
        value: CellValue,
    },
    IsMissing(String),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<CellValue>) -> Self {
        Predicate::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self::compare(column, CompareOp::Ne, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    pub fn le(column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self::compare(column, CompareOp::Le, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    pub fn ge(column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self::compare(column, CompareOp::Ge, value)
    }

    pub fn is_missing(column: impl Into<String>) -> Self {
        Predicate::IsMissing(column.into())
    }

    pub fn not_missing(column: impl Into<String>) -> Self {
        !Predicate::IsMissing(column.into())
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// Every column the predicate reads, in first-mention order.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Compare { column, .. } | Predicate::IsMissing(column) => {
                if !out.contains(&column.as_str()) {
                    out.push(column);
                }
            }
            Predicate::And(a, b) | Predicate::Or(a, b) => {
                a.collect_columns(out);
                b.collect_columns(out);
            }
            Predicate::Not(inner) => inner.collect_columns(out),
        }
    }

    /// Evaluate against every row of `table`.
    ///
    /// Fails with [`crate::EdaError::ColumnNotFound`] before evaluating if a
    /// referenced column does not exist.
    pub fn mask(&self, table: &Table) -> Result<Vec<bool>> {
        let cells = self
            .columns()
            .into_iter()
            .map(|name| Ok((name.to_string(), table.cell_values(name)?)))
            .collect::<Result<HashMap<String, Vec<CellValue>>>>()?;

        Ok((0..table.row_count())
            .map(|row| self.eval(&cells, row))
            .collect())
    }

    fn eval(&self, cells: &HashMap<String, Vec<CellValue>>, row: usize) -> bool {
        match self {
            Predicate::Compare { column, op, value } => {
                let cell = &cells[column][row];
                compare(cell, *op, value)
            }
            Predicate::IsMissing(column) => cells[column][row].is_missing(),
            Predicate::And(a, b) => a.eval(cells, row) && b.eval(cells, row),
            Predicate::Or(a, b) => a.eval(cells, row) || b.eval(cells, row),
            Predicate::Not(inner) => !inner.eval(cells, row),
        }
    }
}

impl std::ops::Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }
}

fn compare(cell: &CellValue, op: CompareOp, value: &CellValue) -> bool {
    if cell.is_missing() || value.is_missing() {
        return false;
    }
    match op {
        CompareOp::Eq => cell == value,
        CompareOp::Ne => cell != value,
        _ if !cell.same_kind(value) => false,
        CompareOp::Lt => cell.cmp(value) == Ordering::Less,
        CompareOp::Le => cell.cmp(value) != Ordering::Greater,
        CompareOp::Gt => cell.cmp(value) == Ordering::Greater,
        CompareOp::Ge => cell.cmp(value) != Ordering::Less,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EdaError;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn passengers() -> Table {
        Table::new(
            df![
                "Sex" => ["male", "female", "female", "male", "female"],
                "Age" => [Some(22.0), Some(38.0), None, Some(12.0), Some(15.0)],
                "Embarked" => [Some("S"), Some("C"), Some("S"), None, Some("S")],
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_eq_and_ne() {
        let table = passengers();
        assert_eq!(
            Predicate::eq("Sex", "female").mask(&table).unwrap(),
            vec![false, true, true, false, true]
        );
        // missing Embarked is neither equal nor unequal to "S"
        assert_eq!(
            Predicate::ne("Embarked", "S").mask(&table).unwrap(),
            vec![false, true, false, false, false]
        );
    }

    #[test]
    fn test_range_and_missing() {
        let table = passengers();
        let teen = Predicate::gt("Age", 12).and(Predicate::le("Age", 19));
        assert_eq!(
            teen.mask(&table).unwrap(),
            vec![false, false, false, false, true]
        );
        assert_eq!(
            Predicate::le("Age", 12).mask(&table).unwrap(),
            vec![false, false, false, true, false]
        );
        assert_eq!(
            Predicate::is_missing("Age").mask(&table).unwrap(),
            vec![false, false, true, false, false]
        );
    }

    #[test]
    fn test_or_and_not() {
        let table = passengers();
        let p = Predicate::eq("Embarked", "C").or(Predicate::is_missing("Embarked"));
        assert_eq!(
            p.mask(&table).unwrap(),
            vec![false, true, false, true, false]
        );
        assert_eq!(
            (!p).mask(&table).unwrap(),
            vec![true, false, true, false, true]
        );
    }

    #[test]
    fn test_integer_threshold_on_float_column() {
        let table = passengers();
        // the threshold is an integer literal, the ages are floats
        assert_eq!(
            Predicate::ge("Age", 15).mask(&table).unwrap(),
            vec![true, true, false, false, true]
        );
    }

    #[test]
    fn test_cross_kind_ordering_is_false() {
        let table = passengers();
        assert_eq!(
            Predicate::lt("Sex", 5).mask(&table).unwrap(),
            vec![false; 5]
        );
    }

    #[test]
    fn test_unknown_column() {
        let err = Predicate::eq("Cabin", "C85").mask(&passengers()).unwrap_err();
        assert!(matches!(err, EdaError::ColumnNotFound(_)));
    }

    #[test]
    fn test_columns_deduplicated() {
        let p = Predicate::gt("Age", 12).and(Predicate::le("Age", 19).or(Predicate::eq("Sex", "male")));
        assert_eq!(p.columns(), vec!["Age", "Sex"]);
    }
}
