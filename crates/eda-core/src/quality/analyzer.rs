use crate::config::DuplicatePolicy;
use crate::error::Result;
use crate::table::{CellValue, Table};
use crate::types::{DuplicateReport, MissingReport, MissingStats};
use std::collections::HashSet;
use tracing::{debug, info};

pub struct QualityAnalyzer;

impl QualityAnalyzer {
    /// Missing-value count and ratio for every column.
    ///
    /// Fails with [`crate::EdaError::EmptyTable`] on a table without rows,
    /// since the ratio would be undefined.
    pub fn missing_report(table: &Table) -> Result<MissingReport> {
        table.ensure_not_empty()?;
        let row_count = table.row_count();

        let columns = table
            .column_names()
            .into_iter()
            .map(|column| {
                let count = table
                    .cell_values(&column)?
                    .iter()
                    .filter(|v| v.is_missing())
                    .count();
                Ok(MissingStats {
                    ratio: count as f64 / row_count as f64,
                    column,
                    count,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let report = MissingReport { row_count, columns };
        debug!(
            "Missing values: {} cells across {} column(s)",
            report.total_missing(),
            report.columns_with_missing().len()
        );
        Ok(report)
    }

    /// Rows whose cells all equal an earlier row's cells.
    ///
    /// The first occurrence of a row is never a duplicate. Missing cells
    /// compare equal to each other here.
    pub fn duplicate_report(table: &Table) -> Result<DuplicateReport> {
        table.ensure_not_empty()?;
        let rows = table.rows()?;
        let mut seen: HashSet<&[CellValue]> = HashSet::with_capacity(rows.len());
        let duplicates: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| (!seen.insert(row.as_slice())).then_some(idx))
            .collect();

        debug!("Found {} duplicate row(s)", duplicates.len());
        Ok(DuplicateReport {
            count: duplicates.len(),
            rows: duplicates,
        })
    }

    /// Apply a duplicate policy, returning the table to summarize and how many rows were removed.
    pub fn deduplicate(table: &Table, policy: DuplicatePolicy) -> Result<(Table, usize)> {
        match policy {
            DuplicatePolicy::Keep => Ok((table.clone(), 0)),
            DuplicatePolicy::Drop => {
                let report = Self::duplicate_report(table)?;
                if report.count == 0 {
                    return Ok((table.clone(), 0));
                }
                let mut keep = vec![true; table.row_count()];
                for idx in &report.rows {
                    keep[*idx] = false;
                }
                let deduped = table.filter_rows(&keep)?;
                info!("Removed {} duplicate row(s)", report.count);
                Ok((deduped, report.count))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EdaError;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn with_duplicates() -> Table {
        Table::new(
            df![
                "alcohol" => [Some(9.4), Some(9.8), Some(9.4), None, None, Some(9.8)],
                "quality" => [5i64, 5, 5, 6, 6, 6],
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_missing_report() {
        let report = QualityAnalyzer::missing_report(&with_duplicates()).unwrap();
        assert_eq!(report.row_count, 6);
        let alcohol = report.get("alcohol").unwrap();
        assert_eq!(alcohol.count, 2);
        assert!((alcohol.ratio - 2.0 / 6.0).abs() < 1e-12);
        assert_eq!(report.get("quality").unwrap().count, 0);
    }

    #[test]
    fn test_reports_reject_empty_table() {
        let table = Table::new(df!["a" => Vec::<f64>::new()].unwrap());
        assert!(matches!(
            QualityAnalyzer::missing_report(&table),
            Err(EdaError::EmptyTable)
        ));
        assert!(matches!(
            QualityAnalyzer::duplicate_report(&table),
            Err(EdaError::EmptyTable)
        ));
    }

    #[test]
    fn test_duplicate_report() {
        let report = QualityAnalyzer::duplicate_report(&with_duplicates()).unwrap();
        // row 2 repeats row 0, row 4 repeats row 3 (missing == missing); row 5 differs in quality
        assert_eq!(report.rows, vec![2, 4]);
        assert_eq!(report.count, 2);
    }

    #[test]
    fn test_duplicate_count_matches_distinct_rows() {
        let table = with_duplicates();
        let report = QualityAnalyzer::duplicate_report(&table).unwrap();
        let distinct = table
            .dataframe()
            .unique::<&str, &str>(None, UniqueKeepStrategy::First, None)
            .unwrap()
            .height();
        assert_eq!(report.count, table.row_count() - distinct);
    }

    #[test]
    fn test_deduplicate_keep_and_drop() {
        let table = with_duplicates();

        let (kept, removed) = QualityAnalyzer::deduplicate(&table, DuplicatePolicy::Keep).unwrap();
        assert_eq!(kept.row_count(), 6);
        assert_eq!(removed, 0);

        let (dropped, removed) =
            QualityAnalyzer::deduplicate(&table, DuplicatePolicy::Drop).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(
            dropped.numeric_values("alcohol").unwrap(),
            vec![Some(9.4), Some(9.8), None, Some(9.8)]
        );
        assert_eq!(
            QualityAnalyzer::duplicate_report(&dropped).unwrap().count,
            0
        );
    }
}
