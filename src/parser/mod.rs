//! Parser layer for reading tabular source files

mod csv;
mod excel;
mod json;
mod parquet;

use std::path::Path;

use crate::error::LoadError;
use crate::model::Table;
use crate::normalize::NullPolicy;

pub use self::csv::CsvParser;
pub use self::excel::ExcelParser;
pub use self::json::JsonParser;
pub use self::parquet::ParquetParser;

/// Per-source options handed to a parser
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions<'a> {
    /// Which raw values count as missing
    pub null_policy: &'a NullPolicy,
    /// For workbooks: which sheet to read (first sheet when unset)
    pub sheet: Option<&'a str>,
}

impl<'a> ReadOptions<'a> {
    pub fn new(null_policy: &'a NullPolicy) -> Self {
        Self {
            null_policy,
            sheet: None,
        }
    }

    pub fn with_sheet(mut self, sheet: Option<&'a str>) -> Self {
        self.sheet = sheet;
        self
    }
}

/// Trait for parsing tabular data files
pub trait Parser: Send + Sync {
    /// Parse a file and return a Table whose missing cells are marked with
    /// [`CellValue::MISSING`](crate::model::CellValue::MISSING) or `Null`
    fn parse(&self, path: &Path, options: &ReadOptions<'_>) -> Result<Table, LoadError>;

    /// Check if this parser can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Factory for creating parsers based on file extension
pub struct ParserFactory {
    parsers: Vec<Box<dyn Parser>>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    /// Create a new parser factory with all supported parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(CsvParser),
                Box::new(ExcelParser),
                Box::new(ParquetParser),
                Box::new(JsonParser),
            ],
        }
    }

    /// Get a parser for the given file path
    pub fn get_parser(&self, path: &Path) -> Result<&dyn Parser, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        self.parsers
            .iter()
            .find(|p| p.supports_extension(&ext))
            .map(|p| p.as_ref())
            .ok_or_else(|| LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
    }

    /// Parse a file using the appropriate parser
    pub fn parse(&self, path: &Path, options: &ReadOptions<'_>) -> Result<Table, LoadError> {
        let parser = self.get_parser(path)?;

        // Report a missing file as such, whatever the format
        std::fs::metadata(path).map_err(|e| LoadError::io(path, e))?;

        parser.parse(path, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_selection_by_extension() {
        let factory = ParserFactory::new();
        assert!(factory.get_parser(Path::new("cluster_tipologi.csv")).is_ok());
        assert!(factory.get_parser(Path::new("cluster.XLSX")).is_ok());
        assert!(factory.get_parser(Path::new("cluster.parquet")).is_ok());
        assert!(factory.get_parser(Path::new("cluster.json")).is_ok());
        assert!(matches!(
            factory.get_parser(Path::new("cluster.sav")),
            Err(LoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_missing_file_reports_not_found() {
        let factory = ParserFactory::new();
        let policy = NullPolicy::default();
        let result = factory.parse(
            Path::new("/definitely/not/here/cluster_ekonomi.csv"),
            &ReadOptions::new(&policy),
        );
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }
}
