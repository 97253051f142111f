//! JSON array parser

use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexSet;
use serde_json::Value;

use crate::error::LoadError;
use crate::model::{CellValue, Column, Table};

use super::{Parser, ReadOptions};

/// Parser for files holding a JSON array of flat objects
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse(&self, path: &Path, _options: &ReadOptions<'_>) -> Result<Table, LoadError> {
        let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
        let value: Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| LoadError::malformed(path, "json", e))?;

        let Value::Array(items) = value else {
            return Err(LoadError::malformed(path, "json", "top-level value must be an array"));
        };

        let mut objects = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(obj) => objects.push(obj),
                other => {
                    return Err(LoadError::malformed(
                        path,
                        "json",
                        format!("element {} is not an object: {}", i, other),
                    ))
                }
            }
        }

        // Union of keys across all objects, in first-seen order
        let mut column_names: IndexSet<String> = IndexSet::new();
        for obj in &objects {
            for key in obj.keys() {
                column_names.insert(key.clone());
            }
        }

        let columns: Vec<Column> = column_names
            .iter()
            .enumerate()
            .map(|(i, name)| Column::new(name.clone(), i))
            .collect();

        let mut table = Table::new(columns);

        for (i, obj) in objects.iter().enumerate() {
            let cells = column_names
                .iter()
                .map(|key| json_value_to_cell(obj.get(key)))
                .collect();
            table.add_row(cells, i + 1);
        }

        table.refresh_column_types();
        Ok(table)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case("json")
    }
}

fn json_value_to_cell(value: Option<&Value>) -> CellValue {
    match value {
        None => CellValue::MISSING,
        Some(Value::Null) => CellValue::Null,
        Some(Value::Bool(b)) => CellValue::Bool(*b),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                CellValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                CellValue::from_u64(u)
            } else {
                n.as_f64().map_or(CellValue::MISSING, CellValue::Float)
            }
        }
        Some(Value::String(s)) => CellValue::String(Cow::Owned(s.clone())),
        // Nested values are kept as their compact JSON text
        Some(nested) => CellValue::String(Cow::Owned(nested.to_string())),
    }
}
