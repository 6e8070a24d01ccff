//! CSV loading into a [`Table`].

use crate::config::EdaConfig;
use crate::error::{EdaError, Result, ResultExt};
use crate::registry::ColumnRegistry;
use crate::table::Table;
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Rows sampled for schema inference.
const INFER_SCHEMA_ROWS: usize = 1000;

/// Reads delimited text with a header row.
///
/// Empty fields become missing cells. Column types are inferred from the
/// first 1000 rows.
#[derive(Debug, Clone, Copy)]
pub struct CsvLoader {
    separator: u8,
    normalize_names: bool,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl CsvLoader {
    pub fn new(separator: u8) -> Self {
        Self {
            separator,
            normalize_names: false,
        }
    }

    /// Loader using the configured separator and name normalization.
    pub fn from_config(config: &EdaConfig) -> Self {
        Self {
            separator: config.separator,
            normalize_names: config.normalize_names,
        }
    }

    /// Rename columns with [`ColumnRegistry::normalize`] after reading.
    pub fn normalize_names(mut self, normalize: bool) -> Self {
        self.normalize_names = normalize;
        self
    }

    fn options(&self) -> CsvReadOptions {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(self.separator)
                    .with_quote_char(Some(b'"'))
                    .with_missing_is_null(true),
            )
    }

    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Table> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EdaError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found: {}", path.display()),
            )));
        }

        debug!("Reading '{}' (separator {:?})", path.display(), self.separator as char);
        let df = self
            .options()
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .context(format!("Failed to open '{}'", path.display()))?
            .finish()
            .context(format!("Failed to parse '{}'", path.display()))?;

        info!("Loaded '{}': {} rows x {} columns", path.display(), df.height(), df.width());
        self.finish(df)
    }

    /// Parse CSV text held in memory.
    pub fn load_str(&self, content: &str) -> Result<Table> {
        let df = self
            .options()
            .into_reader_with_file_handle(Cursor::new(content.to_owned()))
            .finish()
            .context("Failed to parse CSV content")?;
        self.finish(df)
    }

    fn finish(&self, df: DataFrame) -> Result<Table> {
        let table = Table::new(df);
        if self.normalize_names {
            ColumnRegistry::normalize(&table)
        } else {
            Ok(table)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use pretty_assertions::assert_eq;

    const WINE: &str = "fixed acidity;citric acid;quality\n7.4;0;5\n7.8;0.04;5\n7.4;0;5\n";

    #[test]
    fn test_load_semicolon_separated() {
        let table = CsvLoader::new(b';').load_str(WINE).unwrap();
        assert_eq!(table.shape(), (3, 3));
        assert_eq!(table.column_names()[0], "fixed acidity");
        assert_eq!(
            table.numeric_values("citric acid").unwrap(),
            vec![Some(0.0), Some(0.04), Some(0.0)]
        );
    }

    #[test]
    fn test_load_with_normalization() {
        let table = CsvLoader::new(b';')
            .normalize_names(true)
            .load_str(WINE)
            .unwrap();
        assert_eq!(
            table.column_names(),
            vec!["fixed_acidity", "citric_acid", "quality"]
        );
    }

    #[test]
    fn test_empty_fields_are_missing() {
        let csv = "PassengerId,Age,Embarked\n1,22,S\n2,,C\n3,26,\n";
        let table = CsvLoader::default().load_str(csv).unwrap();
        assert_eq!(table.numeric_values("Age").unwrap()[1], None);
        assert_eq!(table.cell_values("Embarked").unwrap()[2], CellValue::Missing);
    }

    #[test]
    fn test_missing_file() {
        let err = CsvLoader::default()
            .load_path("/definitely/not/here.csv")
            .unwrap_err();
        assert!(matches!(err, EdaError::Io(_)));
    }

    #[test]
    fn test_from_config() {
        let config = EdaConfig::builder().separator(b';').build().unwrap();
        let table = CsvLoader::from_config(&config).load_str(WINE).unwrap();
        assert!(table.has_column("citric_acid"));
    }
}
