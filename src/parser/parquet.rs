//! Parquet file parser

use std::borrow::Cow;
use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType as ArrowType, Float16Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type,
    Int8Type, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow::error::ArrowError;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::LoadError;
use crate::model::{CellValue, Column, Table};

use super::{Parser, ReadOptions};

/// Parser for Parquet files
pub struct ParquetParser;

impl Parser for ParquetParser {
    fn parse(&self, path: &Path, _options: &ReadOptions<'_>) -> Result<Table, LoadError> {
        let file = File::open(path).map_err(|e| LoadError::io(path, e))?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| LoadError::malformed(path, "parquet", e))?;

        let columns: Vec<Column> = builder
            .schema()
            .fields()
            .iter()
            .enumerate()
            .map(|(i, field)| Column::new(field.name().clone(), i))
            .collect();
        let mut table = Table::new(columns);

        let reader = builder
            .build()
            .map_err(|e| LoadError::malformed(path, "parquet", e))?;

        let mut line_num = 1usize;
        for batch in reader {
            let batch = batch.map_err(|e| LoadError::malformed(path, "parquet", e))?;

            let mut column_cells = batch
                .columns()
                .iter()
                .map(|col| column_to_cells(col).map(Vec::into_iter))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| LoadError::malformed(path, "parquet", e))?;

            for _ in 0..batch.num_rows() {
                line_num += 1;
                let cells = column_cells
                    .iter_mut()
                    .map(|cells| cells.next().unwrap_or(CellValue::MISSING))
                    .collect();
                table.add_row(cells, line_num);
            }
        }

        table.refresh_column_types();
        Ok(table)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "parquet" | "pq")
    }
}

macro_rules! primitive_cells {
    ($array:expr, $ty:ty, $variant:ident, $cast:ty) => {{
        let arr = $array.as_primitive::<$ty>();
        (0..arr.len())
            .map(|i| {
                if arr.is_null(i) {
                    CellValue::Null
                } else {
                    CellValue::$variant(arr.value(i) as $cast)
                }
            })
            .collect()
    }};
}

/// Decode one Arrow column into cell values
fn column_to_cells(array: &ArrayRef) -> Result<Vec<CellValue>, ArrowError> {
    let cells = match array.data_type() {
        ArrowType::Null => vec![CellValue::Null; array.len()],
        ArrowType::Boolean => {
            let arr = array.as_boolean();
            (0..arr.len())
                .map(|i| {
                    if arr.is_null(i) {
                        CellValue::Null
                    } else {
                        CellValue::Bool(arr.value(i))
                    }
                })
                .collect()
        }
        ArrowType::Int8 => primitive_cells!(array, Int8Type, Int, i64),
        ArrowType::Int16 => primitive_cells!(array, Int16Type, Int, i64),
        ArrowType::Int32 => primitive_cells!(array, Int32Type, Int, i64),
        ArrowType::Int64 => primitive_cells!(array, Int64Type, Int, i64),
        ArrowType::UInt8 => primitive_cells!(array, UInt8Type, Int, i64),
        ArrowType::UInt16 => primitive_cells!(array, UInt16Type, Int, i64),
        ArrowType::UInt32 => primitive_cells!(array, UInt32Type, Int, i64),
        ArrowType::UInt64 => {
            let arr = array.as_primitive::<UInt64Type>();
            (0..arr.len())
                .map(|i| {
                    if arr.is_null(i) {
                        CellValue::Null
                    } else {
                        CellValue::from_u64(arr.value(i))
                    }
                })
                .collect()
        }
        ArrowType::Float16 => {
            let arr = array.as_primitive::<Float16Type>();
            (0..arr.len())
                .map(|i| {
                    if arr.is_null(i) {
                        CellValue::Null
                    } else {
                        CellValue::Float(arr.value(i).to_f64())
                    }
                })
                .collect()
        }
        ArrowType::Float32 => primitive_cells!(array, Float32Type, Float, f64),
        ArrowType::Float64 => primitive_cells!(array, Float64Type, Float, f64),
        ArrowType::Utf8 => string_cells(array.as_string::<i32>().iter()),
        ArrowType::LargeUtf8 => string_cells(array.as_string::<i64>().iter()),
        _ => {
            // Dates, timestamps, decimals and nested types use Arrow's own rendering
            let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;
            (0..array.len())
                .map(|i| {
                    if array.is_null(i) {
                        CellValue::Null
                    } else {
                        CellValue::String(Cow::Owned(formatter.value(i).to_string()))
                    }
                })
                .collect()
        }
    };

    Ok(cells)
}

fn string_cells<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<CellValue> {
    values
        .map(|v| match v {
            Some(s) => CellValue::String(Cow::Owned(s.to_string())),
            None => CellValue::Null,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int32Array, StringArray, UInt64Array};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::normalize::NullPolicy;

    #[test]
    fn test_column_to_cells() {
        let ints: ArrayRef = Arc::new(Int32Array::from(vec![Some(1), None, Some(3)]));
        assert_eq!(
            column_to_cells(&ints).unwrap(),
            vec![CellValue::Int(1), CellValue::Null, CellValue::Int(3)]
        );

        let names: ArrayRef = Arc::new(StringArray::from(vec![Some("A"), None]));
        assert_eq!(
            column_to_cells(&names).unwrap(),
            vec![CellValue::from("A"), CellValue::Null]
        );

        let ids: ArrayRef = Arc::new(UInt64Array::from(vec![Some(5), Some(u64::MAX), None]));
        assert_eq!(
            column_to_cells(&ids).unwrap(),
            vec![CellValue::Int(5), CellValue::UInt(u64::MAX), CellValue::Null]
        );
    }

    #[test]
    fn test_parse_parquet_file() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("desa", ArrowType::Utf8, false),
            Field::new("skor", ArrowType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["Sukamaju", "Cibodas"])),
                Arc::new(Float64Array::from(vec![Some(7.5), None])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new()
            .suffix(".parquet")
            .tempfile()
            .unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let policy = NullPolicy::default();
        let table = ParquetParser
            .parse(file.path(), &ReadOptions::new(&policy))
            .unwrap();

        assert_eq!(table.column_names(), vec!["desa", "skor"]);
        assert_eq!(table.rows[0].cells, vec![CellValue::from("Sukamaju"), CellValue::Float(7.5)]);
        assert_eq!(table.rows[1].cells[1], CellValue::Null);
    }
}
