//! Data quality analysis module.
//!
//! This module reports missing values and duplicate rows, and applies the
//! caller's duplicate policy.

mod analyzer;

pub use analyzer::QualityAnalyzer;
