//! Pairwise-complete Pearson correlation over numeric columns.
//!
//! Each coefficient uses only the rows where both columns of the pair are
//! present. A pair that cannot be computed (fewer than two complete pairs,
//! or no variance) is stored as NaN and listed in
//! [`CorrelationMatrix::undefined`]; it never aborts the rest of the matrix.

use crate::error::{EdaError, Result};
use crate::registry::ColumnRegistry;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::{debug, warn};

/// Square, symmetric matrix of Pearson coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major; `values[i][j]` pairs `columns[i]` with `columns[j]`. NaN marks an undefined cell.
    #[serde(deserialize_with = "crate::utils::nan_as_null::matrix")]
    pub values: Vec<Vec<f64>>,
    /// Complete observation pairs behind each cell; the diagonal holds non-missing counts.
    pub pair_counts: Vec<Vec<usize>>,
    /// Pairs (i < j in column order) whose coefficient is undefined.
    pub undefined: Vec<(String, String)>,
}

impl CorrelationMatrix {
    fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Coefficient for a pair; NaN if undefined, `None` if a column is not in the matrix.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        Some(self.values[i][j])
    }

    /// Coefficient for a pair, failing instead of returning NaN.
    pub fn coefficient(&self, a: &str, b: &str) -> Result<f64> {
        let i = self
            .index_of(a)
            .ok_or_else(|| EdaError::ColumnNotFound(a.to_string()))?;
        let j = self
            .index_of(b)
            .ok_or_else(|| EdaError::ColumnNotFound(b.to_string()))?;
        let value = self.values[i][j];
        if value.is_nan() {
            return Err(EdaError::InsufficientData {
                left: a.to_string(),
                right: b.to_string(),
                pairs: self.pair_counts[i][j],
            });
        }
        Ok(value)
    }

    /// Other columns ordered by descending absolute correlation with `target`.
    /// Undefined cells are skipped.
    pub fn ranked_against(&self, target: &str) -> Result<Vec<(String, f64)>> {
        let i = self
            .index_of(target)
            .ok_or_else(|| EdaError::ColumnNotFound(target.to_string()))?;
        let mut ranked: Vec<(String, f64)> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(j, name)| (name.clone(), self.values[i][j]))
            .filter(|(_, r)| !r.is_nan())
            .collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        Ok(ranked)
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.columns.len();
        (0..n).all(|i| {
            (0..n).all(|j| {
                let (a, b) = (self.values[i][j], self.values[j][i]);
                (a.is_nan() && b.is_nan()) || a == b
            })
        })
    }
}

/// Result of correlating one pair.
struct PairStats {
    pairs: usize,
    coefficient: f64,
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

/// Pearson coefficient over the rows where both values are present.
fn pairwise_pearson(x: &[Option<f64>], y: &[Option<f64>]) -> PairStats {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip();
    let n = xs.len();
    if n < 2 {
        return PairStats {
            pairs: n,
            coefficient: f64::NAN,
        };
    }

    let coefficient = if is_constant(&xs) || is_constant(&ys) {
        f64::NAN
    } else {
        let (xs, ys) = (xs.as_slice(), ys.as_slice());
        (xs.covariance(ys) / (xs.std_dev() * ys.std_dev())).clamp(-1.0, 1.0)
    };
    PairStats {
        pairs: n,
        coefficient,
    }
}

/// Correlation engine.
pub struct CorrelationEngine;

impl CorrelationEngine {
    /// Correlate numeric columns pairwise.
    ///
    /// With `columns == None` the numeric and discrete columns found by
    /// [`ColumnRegistry::classify`] are used, in table order. A requested
    /// column that is not numeric fails with [`EdaError::TypeMismatch`].
    pub fn correlate(table: &Table, columns: Option<&[&str]>) -> Result<CorrelationMatrix> {
        table.ensure_not_empty()?;

        let names: Vec<String> = match columns {
            Some(requested) => requested.iter().map(|c| c.to_string()).collect(),
            None => ColumnRegistry::numeric_columns(&ColumnRegistry::classify(table)?),
        };
        let series = names
            .iter()
            .map(|name| table.numeric_values(name))
            .collect::<Result<Vec<_>>>()?;

        let size = names.len();
        let mut values = vec![vec![f64::NAN; size]; size];
        let mut pair_counts = vec![vec![0usize; size]; size];
        let mut undefined = Vec::new();

        for i in 0..size {
            let present = series[i].iter().flatten().count();
            pair_counts[i][i] = present;
            if present >= 2 {
                values[i][i] = 1.0;
            }

            for j in (i + 1)..size {
                let stats = pairwise_pearson(&series[i], &series[j]);
                values[i][j] = stats.coefficient;
                values[j][i] = stats.coefficient;
                pair_counts[i][j] = stats.pairs;
                pair_counts[j][i] = stats.pairs;

                if stats.coefficient.is_nan() {
                    warn!(
                        "Correlation '{}' x '{}' undefined ({} complete pair(s))",
                        names[i], names[j], stats.pairs
                    );
                    undefined.push((names[i].clone(), names[j].clone()));
                } else {
                    debug!(
                        "Correlation '{}' x '{}' = {:.4} over {} pair(s)",
                        names[i], names[j], stats.coefficient, stats.pairs
                    );
                }
            }
        }

        Ok(CorrelationMatrix {
            columns: names,
            values,
            pair_counts,
            undefined,
        })
    }
}
