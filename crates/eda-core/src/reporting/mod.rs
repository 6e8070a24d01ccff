//! Report generation.
//!
//! [`EdaReport`] bundles every engine's output for one table. It serves the
//! `--json` CLI flag (printed to stdout), the `--emit-report` flag (written
//! to a file) and library callers alike.
//!
//! # Example
//!
//! ```rust,ignore
//! use eda_core::{CsvLoader, EdaConfig, ReportGenerator};
//!
//! let config = EdaConfig::builder().separator(b';').build()?;
//! let table = CsvLoader::from_config(&config).load_path("winequality-red.csv")?;
//! let report = ReportGenerator::generate(&table, &config)?;
//!
//! println!("{}", report.to_json_pretty()?);
//! ReportGenerator::new("output".into()).write_report_to_file(&report, "winequality-red")?;
//! ```

mod generator;

pub use generator::{EdaReport, ReportGenerator, TableShape};
