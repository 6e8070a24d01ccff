//! Configuration types for the EDA engine.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic report setup.

use serde::{Deserialize, Serialize};

/// What to do with rows that repeat an earlier row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DuplicatePolicy {
    /// Keep duplicates (e.g. repeated ratings of similar wines are legitimate data)
    #[default]
    Keep,
    /// Drop every row that repeats an earlier row, keeping first occurrences
    Drop,
}

/// Configuration for loading and summarizing a table.
///
/// Use [`EdaConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use eda_core::config::{DuplicatePolicy, EdaConfig};
///
/// let config = EdaConfig::builder()
///     .separator(b';')
///     .duplicate_policy(DuplicatePolicy::Keep)
///     .histogram_bins(10)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdaConfig {
    /// Field delimiter of the input file.
    /// Default: `,`
    pub separator: u8,

    /// Whether to normalize column names (whitespace → underscores) after loading.
    /// Default: true
    pub normalize_names: bool,

    /// Integral numeric columns with at most this many distinct values are
    /// flagged as discrete and get a frequency table.
    /// Default: 10
    pub discrete_max_cardinality: usize,

    /// Distinct-value ratio (0.0 - 1.0] at which a text column is treated as an identifier.
    /// Default: 1.0 (every value distinct)
    pub identifier_min_unique_ratio: f64,

    /// Whether duplicate rows are kept or dropped before summarizing.
    /// Default: Keep
    pub duplicate_policy: DuplicatePolicy,

    /// Decimal places used when rounding proportions.
    /// Default: 2
    pub proportion_precision: u32,

    /// Number of equal-width bins for histograms.
    /// Default: 10
    pub histogram_bins: usize,

    /// Number of rows returned by top-N queries.
    /// Default: 5
    pub top_n: usize,
}

impl Default for EdaConfig {
    fn default() -> Self {
        Self {
            separator: b',',
            normalize_names: true,
            discrete_max_cardinality: 10,
            identifier_min_unique_ratio: 1.0,
            duplicate_policy: DuplicatePolicy::default(),
            proportion_precision: 2,
            histogram_bins: 10,
            top_n: 5,
        }
    }
}

impl EdaConfig {
    /// Create a new configuration builder.
    pub fn builder() -> EdaConfigBuilder {
        EdaConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.identifier_min_unique_ratio <= 0.0 || self.identifier_min_unique_ratio > 1.0 {
            return Err(ConfigValidationError::InvalidRatio {
                field: "identifier_min_unique_ratio".to_string(),
                value: self.identifier_min_unique_ratio,
            });
        }

        if self.discrete_max_cardinality == 0 {
            return Err(ConfigValidationError::MustBePositive(
                "discrete_max_cardinality".to_string(),
            ));
        }

        if self.histogram_bins == 0 {
            return Err(ConfigValidationError::MustBePositive(
                "histogram_bins".to_string(),
            ));
        }

        if !self.separator.is_ascii() || matches!(self.separator, b'"' | b'\n' | b'\r') {
            return Err(ConfigValidationError::InvalidSeparator(self.separator));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid ratio for '{field}': {value} (must be in (0.0, 1.0])")]
    InvalidRatio { field: String, value: f64 },

    #[error("'{0}' must be at least 1")]
    MustBePositive(String),

    #[error("Invalid separator byte: {0:#04x}")]
    InvalidSeparator(u8),
}

impl From<ConfigValidationError> for crate::error::EdaError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::EdaError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`EdaConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct EdaConfigBuilder {
    separator: Option<u8>,
    normalize_names: Option<bool>,
    discrete_max_cardinality: Option<usize>,
    identifier_min_unique_ratio: Option<f64>,
    duplicate_policy: Option<DuplicatePolicy>,
    proportion_precision: Option<u32>,
    histogram_bins: Option<usize>,
    top_n: Option<usize>,
}

impl EdaConfigBuilder {
    /// Set the field delimiter (e.g. `b';'` for the wine quality data).
    pub fn separator(mut self, separator: u8) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Enable or disable column name normalization.
    pub fn normalize_names(mut self, normalize: bool) -> Self {
        self.normalize_names = Some(normalize);
        self
    }

    /// Set the maximum distinct count for a numeric column to count as discrete.
    pub fn discrete_max_cardinality(mut self, max: usize) -> Self {
        self.discrete_max_cardinality = Some(max);
        self
    }

    /// Set the distinct-value ratio for text identifier detection.
    ///
    /// # Arguments
    /// * `ratio` - Value in (0.0, 1.0] (e.g., 0.95 = 95% of values distinct)
    pub fn identifier_min_unique_ratio(mut self, ratio: f64) -> Self {
        self.identifier_min_unique_ratio = Some(ratio);
        self
    }

    /// Set the duplicate-row policy.
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = Some(policy);
        self
    }

    /// Set the rounding precision for proportions.
    pub fn proportion_precision(mut self, precision: u32) -> Self {
        self.proportion_precision = Some(precision);
        self
    }

    /// Set the number of histogram bins.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Set the number of rows returned by top-N queries.
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `EdaConfig` or an error if validation fails.
    pub fn build(self) -> Result<EdaConfig, ConfigValidationError> {
        let defaults = EdaConfig::default();
        let config = EdaConfig {
            separator: self.separator.unwrap_or(defaults.separator),
            normalize_names: self.normalize_names.unwrap_or(defaults.normalize_names),
            discrete_max_cardinality: self
                .discrete_max_cardinality
                .unwrap_or(defaults.discrete_max_cardinality),
            identifier_min_unique_ratio: self
                .identifier_min_unique_ratio
                .unwrap_or(defaults.identifier_min_unique_ratio),
            duplicate_policy: self.duplicate_policy.unwrap_or_default(),
            proportion_precision: self
                .proportion_precision
                .unwrap_or(defaults.proportion_precision),
            histogram_bins: self.histogram_bins.unwrap_or(defaults.histogram_bins),
            top_n: self.top_n.unwrap_or(defaults.top_n),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EdaConfig::default();
        assert_eq!(config.separator, b',');
        assert!(config.normalize_names);
        assert_eq!(config.discrete_max_cardinality, 10);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Keep);
        assert_eq!(config.proportion_precision, 2);
        assert_eq!(config.histogram_bins, 10);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = EdaConfig::builder()
            .separator(b';')
            .duplicate_policy(DuplicatePolicy::Drop)
            .discrete_max_cardinality(12)
            .proportion_precision(4)
            .build()
            .unwrap();

        assert_eq!(config.separator, b';');
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Drop);
        assert_eq!(config.discrete_max_cardinality, 12);
        assert_eq!(config.proportion_precision, 4);
    }

    #[test]
    fn test_validation_invalid_ratio() {
        let result = EdaConfig::builder()
            .identifier_min_unique_ratio(1.5)
            .build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidRatio { .. }
        ));
    }

    #[test]
    fn test_validation_zero_bins() {
        let result = EdaConfig::builder().histogram_bins(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::MustBePositive(_)
        ));
    }

    #[test]
    fn test_validation_quote_separator() {
        let result = EdaConfig::builder().separator(b'"').build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidSeparator(b'"')
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "separator": 59,
            "normalize_names": false,
            "discrete_max_cardinality": 8,
            "identifier_min_unique_ratio": 0.9,
            "duplicate_policy": "Drop",
            "proportion_precision": 3,
            "histogram_bins": 20,
            "top_n": 3
        }"#;

        let config: EdaConfig = serde_json::from_str(json).expect("should deserialize");
        assert_eq!(config.separator, b';');
        assert!(!config.normalize_names);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Drop);
        assert_eq!(config.top_n, 3);
        assert!(config.validate().is_ok());
    }
}
