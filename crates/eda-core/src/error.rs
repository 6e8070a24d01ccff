//! Error types for the EDA engine.
//!
//! Every failure an engine can raise is a variant of [`EdaError`]. Errors are
//! raised at the offending call and never retried: all operations are pure
//! functions of their input table.
//!
//! Errors serialize as `{ code, message }` so reports and front-ends can
//! branch on a stable code instead of parsing the message.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the EDA engine.
#[derive(Error, Debug)]
pub enum EdaError {
    /// Column names collide after normalization.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A statistic was requested on a table without rows.
    #[error("Table has no rows")]
    EmptyTable,

    /// An operation was requested on a column of an incompatible semantic type.
    #[error("Column '{column}' is {actual}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    /// Fewer than two complete observation pairs exist for a coefficient.
    #[error("Insufficient data for '{left}' x '{right}': {pairs} complete pair(s)")]
    InsufficientData {
        left: String,
        right: String,
        pairs: usize,
    },

    /// An invalid parameter was passed to an operation.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// No non-missing values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EdaError>,
    },
}

impl EdaError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EdaError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a [`EdaError::TypeMismatch`].
    pub fn type_mismatch(
        column: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        EdaError::TypeMismatch {
            column: column.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Shorthand for a [`EdaError::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        EdaError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code for callers that branch on the kind of failure.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Schema(_) => "SCHEMA_ERROR",
            Self::EmptyTable => "EMPTY_TABLE",
            Self::TypeMismatch { .. } => "TYPE_ERROR",
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::InvalidParameter { .. } => "VALUE_ERROR",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error comes from the caller's input rather than from I/O or polars.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::Io(_) | Self::Polars(_) | Self::Json(_) => false,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => true,
        }
    }
}

impl Serialize for EdaError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EdaError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EdaError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| EdaError::Polars(e).with_context(context))
    }
}
