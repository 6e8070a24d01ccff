//! Fill values and column rebuilding for imputation.

use crate::error::{EdaError, Result};
use crate::stats::{DescriptiveStats, summary};
use crate::table::{CellValue, Table};
use polars::prelude::*;

fn kind_name(value: &CellValue) -> &'static str {
    match value {
        CellValue::Missing => "missing",
        CellValue::Bool(_) => "boolean",
        CellValue::Integer(_) | CellValue::Number(_) => "numeric",
        CellValue::Text(_) => "text",
    }
}

/// Non-missing values of a numeric column; `NoValidValues` if there are none.
fn present_numbers(table: &Table, column: &str) -> Result<Vec<f64>> {
    let present: Vec<f64> = table.numeric_values(column)?.into_iter().flatten().collect();
    if present.is_empty() {
        return Err(EdaError::NoValidValues(column.to_string()));
    }
    Ok(present)
}

pub(crate) fn mean_fill(table: &Table, column: &str) -> Result<CellValue> {
    Ok(CellValue::Number(summary::mean(&present_numbers(table, column)?)))
}

pub(crate) fn median_fill(table: &Table, column: &str) -> Result<CellValue> {
    Ok(CellValue::Number(summary::median(&present_numbers(table, column)?)))
}

/// Most frequent value; ties go to the value seen first.
pub(crate) fn mode_fill(table: &Table, column: &str) -> Result<CellValue> {
    DescriptiveStats::value_counts(table, column)?
        .mode()
        .cloned()
        .ok_or_else(|| EdaError::NoValidValues(column.to_string()))
}

fn float_series(column: &str, cells: &[CellValue], fill: &CellValue, value: f64) -> Result<Series> {
    let values = cells
        .iter()
        .map(|cell| match cell {
            CellValue::Missing => Ok(value),
            other => other
                .as_f64()
                .ok_or_else(|| EdaError::type_mismatch(column, kind_name(fill), kind_name(other))),
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(Series::new(column.into(), values))
}

/// Rebuild a column with every missing cell replaced by `fill`.
///
/// The column keeps its kind: integers stay Int64 when the fill is an
/// integer too, other numbers become Float64, booleans stay Boolean and text
/// stays String. A fill of another kind is a type mismatch.
pub(crate) fn fill_missing(
    column: &str,
    cells: &[CellValue],
    fill: &CellValue,
) -> Result<(Series, usize)> {
    let filled = cells.iter().filter(|c| c.is_missing()).count();
    let mismatch = |cell: &CellValue| EdaError::type_mismatch(column, kind_name(fill), kind_name(cell));

    let series = match fill {
        CellValue::Integer(value)
            if cells
                .iter()
                .all(|c| matches!(c, CellValue::Missing | CellValue::Integer(_))) =>
        {
            let values: Vec<i64> = cells
                .iter()
                .map(|cell| match cell {
                    CellValue::Integer(v) => *v,
                    _ => *value,
                })
                .collect();
            Series::new(column.into(), values)
        }
        CellValue::Integer(value) => float_series(column, cells, fill, *value as f64)?,
        CellValue::Number(value) => float_series(column, cells, fill, *value)?,
        CellValue::Bool(value) => {
            let values = cells
                .iter()
                .map(|cell| match cell {
                    CellValue::Missing => Ok(*value),
                    CellValue::Bool(v) => Ok(*v),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<Vec<bool>>>()?;
            Series::new(column.into(), values)
        }
        CellValue::Text(value) => {
            let values = cells
                .iter()
                .map(|cell| match cell {
                    CellValue::Missing => Ok(value.as_str()),
                    CellValue::Text(v) => Ok(v.as_str()),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<Vec<&str>>>()?;
            Series::new(column.into(), values)
        }
        CellValue::Missing => {
            return Err(EdaError::invalid_parameter(
                "fill_value",
                "cannot fill missing cells with a missing value",
            ));
        }
    };
    Ok((series, filled))
}
