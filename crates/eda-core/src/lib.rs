//! Exploratory Data Analysis Engine
//!
//! Summarizes a rectangular dataset (numeric and categorical columns) into
//! schema, quality, descriptive, correlation and grouped-aggregate reports,
//! built on Polars.
//!
//! # Overview
//!
//! - **Column Registry**: name normalization and semantic classification
//!   (numeric, discrete, categorical, identifier)
//! - **Quality Report**: missing values per column, duplicate rows, and a
//!   keep/drop duplicate policy
//! - **Descriptive Statistics**: count, mean, std, quartiles; value counts;
//!   histograms
//! - **Correlation Engine**: pairwise-complete Pearson matrix
//! - **Grouped Aggregates**: filtered mean/sum/count/median by group, top-N
//!   and proportions
//! - **Imputation**: explicit mean/median/mode/constant fills
//!
//! Every engine is a pure function of an immutable [`Table`]; none of them
//! mutates its input.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use eda_core::{AggFn, AggregateEngine, AggregateQuery, CsvLoader, DescriptiveStats, Predicate};
//!
//! let table = CsvLoader::new(b',').load_path("data/train.csv")?;
//!
//! let describe = DescriptiveStats::describe(&table, None)?;
//! println!("Median fare: {}", describe.get("Fare").unwrap().median);
//!
//! let query = AggregateQuery::new("Survived", AggFn::Mean)
//!     .group_by(["Sex"])
//!     .filter(Predicate::eq("Pclass", 1));
//! for (key, rate) in AggregateEngine::aggregate(&table, &query)?.groups {
//!     println!("{}: {:.2}", key, rate);
//! }
//! ```
//!
//! # Configuration
//!
//! [`EdaConfig`] controls loading, classification thresholds and the
//! duplicate policy used by [`ReportGenerator`]:
//!
//! ```rust,ignore
//! use eda_core::config::*;
//!
//! let config = EdaConfig::builder()
//!     .separator(b';')
//!     .discrete_max_cardinality(10)
//!     .duplicate_policy(DuplicatePolicy::Keep)
//!     .build()?;
//! ```

pub mod aggregate;
pub mod config;
pub mod correlation;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod quality;
pub mod registry;
pub mod reporting;
pub mod stats;
pub mod table;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use aggregate::{AggFn, AggregateEngine, AggregateQuery, AggregateResult, CompareOp, Predicate};
pub use config::{ConfigValidationError, DuplicatePolicy, EdaConfig, EdaConfigBuilder};
pub use correlation::{CorrelationEngine, CorrelationMatrix};
pub use error::{EdaError, Result as EdaResult, ResultExt};
pub use imputers::{ImputeOutcome, ImputeStrategy, Imputer};
pub use loader::CsvLoader;
pub use quality::QualityAnalyzer;
pub use registry::ColumnRegistry;
pub use reporting::{EdaReport, ReportGenerator, TableShape};
pub use stats::{DescribeReport, DescriptiveStats};
pub use table::{CellValue, Table};
pub use types::{
    ColumnSchema, DuplicateReport, FrequencyEntry, FrequencyTable, GroupKey, HistogramBin,
    MissingReport, MissingStats, RankedValue, SemanticType, SummaryStats,
};
