//! Descriptive statistics engine.
//!
//! This module provides:
//! - Per-column summary statistics (count, mean, std, min, quartiles, max)
//! - Value-frequency tables for categorical and discrete columns
//! - Distinct counts and equal-width histograms

pub(crate) mod summary;

use crate::error::{EdaError, Result};
use crate::registry::ColumnRegistry;
use crate::table::{CellValue, Table};
use crate::types::{FrequencyEntry, FrequencyTable, HistogramBin, SummaryStats};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Summary statistics for a set of columns, in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescribeReport {
    pub columns: Vec<(String, SummaryStats)>,
}

impl DescribeReport {
    pub fn get(&self, column: &str) -> Option<&SummaryStats> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, stats)| stats)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Descriptive statistics over a [`Table`].
pub struct DescriptiveStats;

impl DescriptiveStats {
    /// Summarize numeric columns.
    ///
    /// With `columns == None` the numeric and discrete columns found by
    /// [`ColumnRegistry::classify`] are used. A requested column that is not
    /// numeric fails with [`EdaError::TypeMismatch`]; see
    /// [`DescriptiveStats::describe_with`] to coerce instead.
    pub fn describe(table: &Table, columns: Option<&[&str]>) -> Result<DescribeReport> {
        Self::describe_with(table, columns, false)
    }

    /// Summarize columns, optionally coercing non-numeric cells
    /// (booleans to 0/1, unparseable text to missing).
    pub fn describe_with(
        table: &Table,
        columns: Option<&[&str]>,
        coerce: bool,
    ) -> Result<DescribeReport> {
        table.ensure_not_empty()?;

        let names: Vec<String> = match columns {
            Some(requested) => requested.iter().map(|c| c.to_string()).collect(),
            None => ColumnRegistry::numeric_columns(&ColumnRegistry::classify(table)?),
        };

        let columns = names
            .into_iter()
            .map(|name| {
                let values = if coerce {
                    table.numeric_values_coerced(&name)?
                } else {
                    table.numeric_values(&name)?
                };
                let present: Vec<f64> = values.into_iter().flatten().collect();
                let stats = summary::summarize(&present);
                debug!(
                    "Described '{}': count={}, mean={:.4}, median={:.4}",
                    name, stats.count, stats.mean, stats.median
                );
                Ok((name, stats))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DescribeReport { columns })
    }

    /// Count occurrences of every distinct value, missing included.
    ///
    /// Entries are ordered by descending count; equal counts keep the order
    /// in which the values first appear in the column.
    pub fn value_counts(table: &Table, column: &str) -> Result<FrequencyTable> {
        table.ensure_not_empty()?;
        let values = table.cell_values(column)?;

        let mut index: HashMap<CellValue, usize> = HashMap::new();
        let mut entries: Vec<FrequencyEntry> = Vec::new();
        for value in values {
            match index.get(&value) {
                Some(&i) => entries[i].count += 1,
                None => {
                    index.insert(value.clone(), entries.len());
                    entries.push(FrequencyEntry { value, count: 1 });
                }
            }
        }
        // stable: ties stay in first-seen order
        entries.sort_by(|a, b| b.count.cmp(&a.count));

        Ok(FrequencyTable {
            column: column.to_string(),
            entries,
        })
    }

    /// Number of distinct non-missing values.
    pub fn n_unique(table: &Table, column: &str) -> Result<usize> {
        table.ensure_not_empty()?;
        let values = table.cell_values(column)?;
        Ok(values
            .iter()
            .filter(|v| !v.is_missing())
            .collect::<HashSet<_>>()
            .len())
    }

    /// Equal-width histogram of a numeric column's non-missing values.
    pub fn histogram(table: &Table, column: &str, bins: usize) -> Result<Vec<HistogramBin>> {
        table.ensure_not_empty()?;
        if bins == 0 {
            return Err(EdaError::invalid_parameter("bins", "must be at least 1"));
        }
        let present: Vec<f64> = table.numeric_values(column)?.into_iter().flatten().collect();
        Ok(summary::build_histogram(&present, bins))
    }
}
