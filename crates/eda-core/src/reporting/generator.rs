use crate::config::EdaConfig;
use crate::correlation::{CorrelationEngine, CorrelationMatrix};
use crate::error::Result;
use crate::quality::QualityAnalyzer;
use crate::registry::ColumnRegistry;
use crate::stats::{DescribeReport, DescriptiveStats};
use crate::table::Table;
use crate::types::{ColumnSchema, DuplicateReport, FrequencyTable, HistogramBin, MissingReport};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableShape {
    pub rows: usize,
    pub columns: usize,
}

/// Everything the engines report about one table.
#[derive(Debug, Clone, Serialize)]
pub struct EdaReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Shape of the table that was summarized (after any duplicate removal)
    pub shape: TableShape,
    /// Semantic type and cardinality of every column
    pub schema: Vec<ColumnSchema>,
    pub missing: MissingReport,
    /// Duplicates found in the loaded table, before the duplicate policy applied
    pub duplicates: DuplicateReport,
    pub duplicates_removed: usize,
    pub describe: DescribeReport,
    /// Value counts of discrete and categorical columns
    pub frequencies: Vec<FrequencyTable>,
    /// Equal-width histograms of numeric columns
    pub histograms: BTreeMap<String, Vec<HistogramBin>>,
    pub correlation: CorrelationMatrix,
}

static_assertions::assert_impl_all!(EdaReport: Send, Sync);

impl EdaReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(self.to_json_pretty()?.as_bytes())?;
        info!("Report saved: {}", path.display());
        Ok(())
    }
}

/// Runs every engine over a table and collects the results.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Build a report.
    ///
    /// Names are normalized and duplicates handled as `config` says; the
    /// input table itself is never modified.
    pub fn generate(table: &Table, config: &EdaConfig) -> Result<EdaReport> {
        config.validate()?;

        let table = if config.normalize_names {
            ColumnRegistry::normalize(table)?
        } else {
            table.clone()
        };

        let duplicates = QualityAnalyzer::duplicate_report(&table)?;
        let (table, duplicates_removed) =
            QualityAnalyzer::deduplicate(&table, config.duplicate_policy)?;

        let missing = QualityAnalyzer::missing_report(&table)?;
        let schema = ColumnRegistry::classify_with(&table, config)?;

        let numeric = ColumnRegistry::numeric_columns(&schema);
        let numeric_refs: Vec<&str> = numeric.iter().map(String::as_str).collect();
        let describe = DescriptiveStats::describe(&table, Some(&numeric_refs))?;
        let correlation = CorrelationEngine::correlate(&table, Some(&numeric_refs))?;

        let histograms = numeric
            .iter()
            .map(|name| {
                let bins = DescriptiveStats::histogram(&table, name, config.histogram_bins)?;
                Ok((name.clone(), bins))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        let frequencies = ColumnRegistry::frequency_columns(&schema)
            .iter()
            .map(|name| DescriptiveStats::value_counts(&table, name))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Report covers {} numeric and {} frequency column(s)",
            numeric.len(),
            frequencies.len()
        );

        Ok(EdaReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            shape: TableShape {
                rows: table.row_count(),
                columns: table.column_count(),
            },
            schema,
            missing,
            duplicates,
            duplicates_removed,
            describe,
            frequencies,
            histograms,
            correlation,
        })
    }

    /// Write a report to `<output_dir>/<base_name>_eda_report.json`.
    pub fn write_report_to_file(&self, report: &EdaReport, base_name: &str) -> Result<PathBuf> {
        let report_path = self
            .output_dir
            .join(format!("{}_eda_report.json", base_name));
        report.save(&report_path)?;
        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;
    use crate::error::EdaError;
    use crate::types::SemanticType;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn wine() -> Table {
        Table::new(
            df![
                "fixed acidity" => [7.4, 7.8, 7.8, 11.2, 7.4, 7.9],
                "citric acid" => [0.0, 0.0, 0.04, 0.56, 0.0, 0.06],
                "quality" => [5i64, 5, 5, 6, 5, 5],
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_generate_keeps_duplicates_by_default() {
        let report = ReportGenerator::generate(&wine(), &EdaConfig::default()).unwrap();
        assert_eq!(report.shape, TableShape { rows: 6, columns: 3 });
        assert_eq!(report.duplicates.rows, vec![4]);
        assert_eq!(report.duplicates_removed, 0);

        let names: Vec<&str> = report.schema.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["fixed_acidity", "citric_acid", "quality"]);
        assert_eq!(report.schema[2].semantic_type, SemanticType::Discrete);

        assert_eq!(report.describe.len(), 3);
        assert_eq!(report.correlation.columns.len(), 3);
        assert_eq!(report.frequencies.len(), 1);
        assert_eq!(report.frequencies[0].column, "quality");
        assert_eq!(report.histograms["fixed_acidity"].len(), 10);
    }

    #[test]
    fn test_generate_drops_duplicates() {
        let config = EdaConfig::builder()
            .duplicate_policy(DuplicatePolicy::Drop)
            .build()
            .unwrap();
        let report = ReportGenerator::generate(&wine(), &config).unwrap();
        assert_eq!(report.shape.rows, 5);
        assert_eq!(report.duplicates.count, 1);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.describe.get("quality").unwrap().count, 5);
    }

    #[test]
    fn test_generate_empty_table() {
        let table = Table::new(df!["a" => Vec::<f64>::new()].unwrap());
        assert!(matches!(
            ReportGenerator::generate(&table, &EdaConfig::default()),
            Err(EdaError::EmptyTable)
        ));
    }

    #[test]
    fn test_report_json() {
        let report = ReportGenerator::generate(&wine(), &EdaConfig::default()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["shape"]["rows"], 6);
        assert_eq!(json["schema"][2]["semantic_type"], "discrete");
        assert!(json["generated_at"].is_string());
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = std::env::temp_dir().join(format!("eda_core_report_{}", std::process::id()));
        let report = ReportGenerator::generate(&wine(), &EdaConfig::default()).unwrap();
        let path = ReportGenerator::new(dir.clone())
            .write_report_to_file(&report, "wine")
            .unwrap();
        assert!(path.ends_with("wine_eda_report.json"));
        assert!(fs::read_to_string(&path).unwrap().contains("\"correlation\""));
        fs::remove_dir_all(&dir).unwrap();
    }
}
