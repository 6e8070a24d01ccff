//! Column registry: name normalization and semantic classification.
//!
//! Classification produces an explicit, ordered column list. Describe and
//! correlation default to [`ColumnRegistry::numeric_columns`] of that list
//! instead of "whatever happens to be numeric", so their output is stable
//! across runs.

mod type_inference;

use crate::config::EdaConfig;
use crate::error::{EdaError, Result};
use crate::table::{CellValue, Table};
use crate::types::{ColumnSchema, SemanticType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace run"));

/// Column registry for normalizing and classifying table columns.
pub struct ColumnRegistry;

impl ColumnRegistry {
    /// Normalize one column name: trim, then collapse each run of whitespace to `_`.
    pub fn normalize_name(name: &str) -> String {
        WHITESPACE_RUN.replace_all(name.trim(), "_").into_owned()
    }

    /// Rename every column to its normalized name.
    ///
    /// Fails with [`EdaError::Schema`] if two columns end up with the same name.
    pub fn normalize(table: &Table) -> Result<Table> {
        let originals = table.column_names();
        let renamed: Vec<String> = originals.iter().map(|n| Self::normalize_name(n)).collect();

        let mut sources: HashMap<&str, Vec<&str>> = HashMap::new();
        for (original, new) in originals.iter().zip(&renamed) {
            sources.entry(new.as_str()).or_default().push(original.as_str());
        }
        let mut collisions: Vec<String> = renamed
            .iter()
            .filter(|new| sources.get(new.as_str()).is_some_and(|s| s.len() > 1))
            .collect::<HashSet<_>>()
            .into_iter()
            .map(|new| format!("{:?} <- {:?}", new, sources[new.as_str()]))
            .collect();
        if !collisions.is_empty() {
            collisions.sort();
            warn!("Column name collisions after normalization: {:?}", collisions);
            return Err(EdaError::Schema(format!(
                "normalized column names collide: {}",
                collisions.join("; ")
            )));
        }

        let mut df = table.dataframe().clone();
        for (original, new) in originals.iter().zip(&renamed) {
            if original != new {
                debug!("Renaming column '{}' -> '{}'", original, new);
                df.rename(original, new.as_str().into())?;
            }
        }
        Ok(Table::new(df))
    }

    /// Classify every column with the default configuration.
    pub fn classify(table: &Table) -> Result<Vec<ColumnSchema>> {
        Self::classify_with(table, &EdaConfig::default())
    }

    /// Classify every column, in table column order.
    pub fn classify_with(table: &Table, config: &EdaConfig) -> Result<Vec<ColumnSchema>> {
        table
            .column_names()
            .into_iter()
            .map(|name| Self::classify_column(table, &name, config))
            .collect()
    }

    fn classify_column(table: &Table, name: &str, config: &EdaConfig) -> Result<ColumnSchema> {
        let values = table.cell_values(name)?;
        let numeric = table.is_numeric(name)?;
        let null_count = values.iter().filter(|v| v.is_missing()).count();
        let unique_count = values
            .iter()
            .filter(|v| !v.is_missing())
            .collect::<HashSet<&CellValue>>()
            .len();

        let semantic_type =
            type_inference::infer_semantic_type(name, &values, numeric, unique_count, config);
        debug!(
            "Column '{}': {} ({} distinct, {} missing)",
            name, semantic_type, unique_count, null_count
        );

        Ok(ColumnSchema {
            name: name.to_string(),
            semantic_type,
            null_count,
            unique_count,
        })
    }

    /// Names of numeric and discrete columns, in schema order.
    pub fn numeric_columns(schema: &[ColumnSchema]) -> Vec<String> {
        Self::columns_where(schema, SemanticType::is_numeric)
    }

    /// Names of discrete and categorical columns, in schema order.
    pub fn frequency_columns(schema: &[ColumnSchema]) -> Vec<String> {
        Self::columns_where(schema, SemanticType::has_frequencies)
    }

    fn columns_where(schema: &[ColumnSchema], pred: impl Fn(SemanticType) -> bool) -> Vec<String> {
        schema
            .iter()
            .filter(|col| pred(col.semantic_type))
            .map(|col| col.name.clone())
            .collect()
    }
}
