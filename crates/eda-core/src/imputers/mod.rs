//! Missing-value imputation.
//!
//! Imputation is an explicit cleaning step, separate from the read-only
//! engines: it returns a new [`Table`] and never touches the input.

mod statistical;

use crate::error::{EdaError, Result};
use crate::table::{CellValue, Table};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// How the fill value for a column is chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Mean of the present values (numeric columns only)
    Mean,
    /// Median of the present values (numeric columns only)
    Median,
    /// Most frequent present value, first-seen on ties
    Mode,
    /// A fixed value of the column's kind
    Constant(CellValue),
}

impl ImputeStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ImputeStrategy::Mean => "mean",
            ImputeStrategy::Median => "median",
            ImputeStrategy::Mode => "mode",
            ImputeStrategy::Constant(_) => "constant",
        }
    }
}

/// What an imputation did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputeOutcome {
    pub column: String,
    pub strategy: ImputeStrategy,
    pub fill_value: CellValue,
    /// Number of cells that were missing and are now filled.
    pub filled: usize,
}

impl fmt::Display for ImputeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fill_value {
            CellValue::Number(v) => write!(
                f,
                "Filled '{}' with {}: {:.2} ({} cell(s))",
                self.column,
                self.strategy.name(),
                v,
                self.filled
            ),
            CellValue::Integer(v) => write!(
                f,
                "Filled '{}' with {}: {} ({} cell(s))",
                self.column,
                self.strategy.name(),
                v,
                self.filled
            ),
            other => write!(
                f,
                "Filled '{}' with {}: '{}' ({} cell(s))",
                self.column,
                self.strategy.name(),
                other,
                self.filled
            ),
        }
    }
}

pub struct Imputer;

impl Imputer {
    /// Fill the missing cells of one column.
    ///
    /// Fails with [`EdaError::NoValidValues`] when a computed strategy has
    /// nothing to compute from, and with [`EdaError::TypeMismatch`] when the
    /// fill value's kind does not match the column.
    pub fn impute(
        table: &Table,
        column: &str,
        strategy: ImputeStrategy,
    ) -> Result<(Table, ImputeOutcome)> {
        let cells = table.cell_values(column)?;

        let fill_value = match &strategy {
            ImputeStrategy::Mean => statistical::mean_fill(table, column)?,
            ImputeStrategy::Median => statistical::median_fill(table, column)?,
            ImputeStrategy::Mode => statistical::mode_fill(table, column)?,
            ImputeStrategy::Constant(value) if value.is_missing() => {
                return Err(EdaError::invalid_parameter(
                    "strategy",
                    "constant fill value must not be missing",
                ));
            }
            ImputeStrategy::Constant(value) => value.clone(),
        };

        let (series, filled) = statistical::fill_missing(column, &cells, &fill_value)?;
        let imputed = table.with_replaced(column, series)?;

        let outcome = ImputeOutcome {
            column: column.to_string(),
            strategy,
            fill_value,
            filled,
        };
        info!("{}", outcome);
        Ok((imputed, outcome))
    }
}
