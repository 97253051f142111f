//! Table, Row, and Cell data structures

use std::borrow::Cow;

use serde::Serialize;

use super::schema::{CellType, Column};

/// A scalar cell value
///
/// Serializes to the matching JSON scalar. `Float(NaN)` is what the
/// readers use for "missing" before normalization; serde_json writes any
/// non-finite float as `null`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Integer above `i64::MAX`
    UInt(u64),
    Float(f64),
    String(Cow<'static, str>),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::UInt(a), CellValue::UInt(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => {
                // Two missing sentinels are the same cell
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (CellValue::String(a), CellValue::String(b)) => a == b,
            _ => false,
        }
    }
}

impl CellValue {
    /// Sentinel for a cell the source marked as missing
    pub const MISSING: CellValue = CellValue::Float(f64::NAN);

    /// Exact integer cell for an unsigned value
    pub fn from_u64(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => CellValue::Int(i),
            Err(_) => CellValue::UInt(value),
        }
    }

    /// Check if the value is the not-yet-normalized missing sentinel
    pub fn is_missing_sentinel(&self) -> bool {
        matches!(self, CellValue::Float(f) if f.is_nan())
    }

    /// Type of this value
    pub fn cell_type(&self) -> CellType {
        match self {
            CellValue::Null => CellType::Null,
            CellValue::Bool(_) => CellType::Bool,
            CellValue::Int(_) | CellValue::UInt(_) => CellType::Int,
            CellValue::Float(f) if f.is_nan() => CellType::Null,
            CellValue::Float(_) => CellType::Float,
            CellValue::String(_) => CellType::String,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(Cow::Owned(s.to_string()))
    }
}

/// A row in the table
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Cell values in column order
    pub cells: Vec<CellValue>,
    /// Original line/row number in source file (1-indexed)
    pub source_line: usize,
}

impl Row {
    pub fn new(cells: Vec<CellValue>, source_line: usize) -> Self {
        Self { cells, source_line }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// A table containing columns and rows
///
/// Every row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Column definitions
    pub columns: Vec<Column>,
    /// All rows in source order
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a new empty table with column definitions
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Create a table from column names and rows of cells.
    ///
    /// Handy for building fixtures in memory. Short rows are padded with
    /// missing cells and long rows truncated.
    pub fn from_rows<S, I>(names: &[S], rows: I) -> Self
    where
        S: AsRef<str>,
        I: IntoIterator<Item = Vec<CellValue>>,
    {
        let columns = names
            .iter()
            .enumerate()
            .map(|(i, name)| Column::new(name.as_ref(), i))
            .collect();

        let mut table = Table::new(columns);
        for (i, cells) in rows.into_iter().enumerate() {
            table.add_row(cells, i + 2);
        }
        table.refresh_column_types();
        table
    }

    /// Add a row to the table, aligning it to the column count
    pub fn add_row(&mut self, mut cells: Vec<CellValue>, source_line: usize) {
        cells.resize(self.column_count(), CellValue::MISSING);
        self.rows.push(Row::new(cells, source_line));
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Recompute each column's `inferred_type` from its cells
    pub fn refresh_column_types(&mut self) {
        for (col_idx, col) in self.columns.iter_mut().enumerate() {
            col.inferred_type = self
                .rows
                .iter()
                .filter_map(|row| row.cells.get(col_idx))
                .fold(CellType::Null, |acc, cell| acc.widen(cell.cell_type()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_row_pads_with_missing() {
        let mut table = Table::new(vec![Column::new("a", 0), Column::new("b", 1)]);
        table.add_row(vec![CellValue::Int(1)], 2);

        assert_eq!(table.rows[0].cells.len(), 2);
        assert!(table.rows[0].cells[1].is_missing_sentinel());
    }

    #[test]
    fn test_missing_sentinels_compare_equal() {
        assert_eq!(CellValue::MISSING, CellValue::Float(f64::NAN));
        assert_ne!(CellValue::MISSING, CellValue::Null);
        assert_ne!(CellValue::Int(1), CellValue::Float(1.0));
    }

    #[test]
    fn test_from_u64_keeps_exact_value() {
        assert_eq!(CellValue::from_u64(42), CellValue::Int(42));
        assert_eq!(
            CellValue::from_u64(i64::MAX as u64 + 1),
            CellValue::UInt(9_223_372_036_854_775_808)
        );
        assert_eq!(CellValue::UInt(u64::MAX).cell_type(), CellType::Int);
    }

    #[test]
    fn test_refresh_column_types() {
        let table = Table::from_rows(
            &["desa", "skor"],
            vec![
                vec!["Sukamaju".into(), CellValue::Int(7)],
                vec!["Cibodas".into(), CellValue::Float(7.5)],
                vec![CellValue::Null, CellValue::MISSING],
            ],
        );

        assert_eq!(table.columns[0].inferred_type, CellType::String);
        assert_eq!(table.columns[1].inferred_type, CellType::Float);
    }

    #[test]
    fn test_cell_value_serializes_to_json_scalars() {
        let cells = vec![
            CellValue::Null,
            CellValue::Bool(true),
            CellValue::Int(3),
            CellValue::UInt(u64::MAX),
            CellValue::Float(7.5),
            CellValue::from("x"),
            CellValue::MISSING,
        ];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[null,true,3,18446744073709551615,7.5,"x",null]"#);
    }
}
