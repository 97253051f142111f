//! JSON record output
//!
//! A table is served as a top-level array with one flat object per row,
//! keys in column order and rows in source order.

use std::io::Write;

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::model::{CellValue, Row, Table};
use crate::store::Dataset;

/// One row keyed by column name
pub type Record = IndexMap<String, serde_json::Value>;

/// JSON output formatter
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    /// Write the records of `table` to `writer`
    pub fn render(&self, table: &Table, writer: &mut dyn Write) -> serde_json::Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &Records(table))?;
        } else {
            serde_json::to_writer(&mut *writer, &Records(table))?;
        }
        Ok(())
    }

    /// Encode the records of `table` into a buffer
    pub fn to_vec(&self, table: &Table) -> serde_json::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(table.row_count() * table.column_count() * 16);
        self.render(table, &mut buf)?;
        Ok(buf)
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// Records of a dataset, eagerly collected
pub fn serialize(dataset: &Dataset) -> Vec<Record> {
    records(&dataset.table).collect()
}

/// Records of a table, one per row in source order
pub fn records(table: &Table) -> impl Iterator<Item = Record> + '_ {
    table.rows.iter().map(move |row| {
        table
            .columns
            .iter()
            .map(|col| {
                let value = row
                    .get(col.index)
                    .map(cell_value_to_json)
                    .unwrap_or(serde_json::Value::Null);
                (col.name.clone(), value)
            })
            .collect()
    })
}

pub fn cell_value_to_json(value: &CellValue) -> serde_json::Value {
    match value {
        CellValue::Null => serde_json::Value::Null,
        CellValue::Bool(b) => serde_json::Value::Bool(*b),
        CellValue::Int(i) => serde_json::json!(*i),
        CellValue::UInt(u) => serde_json::json!(*u),
        // Non-finite floats have no JSON form
        CellValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        CellValue::String(s) => serde_json::Value::String(s.to_string()),
    }
}

/// Serializes a table straight to records without building maps
struct Records<'a>(&'a Table);

struct RecordRef<'a> {
    table: &'a Table,
    row: &'a Row,
}

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.row_count()))?;
        for row in &self.0.rows {
            seq.serialize_element(&RecordRef { table: self.0, row })?;
        }
        seq.end()
    }
}

impl Serialize for RecordRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.column_count()))?;
        for col in &self.table.columns {
            map.serialize_entry(&col.name, self.row.get(col.index).unwrap_or(&CellValue::Null))?;
        }
        map.end()
    }
}
