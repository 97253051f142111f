//! Excel file parser (xlsx, xls, ods)

use std::borrow::Cow;
use std::path::Path;

use calamine::{open_workbook_auto, Data, ExcelDateTime, Range, Reader};
use chrono::{Duration, NaiveDateTime, Timelike};

use crate::error::LoadError;
use crate::model::{dedupe_header, CellValue, Column, Table};

use super::{Parser, ReadOptions};

/// Parser for Excel workbooks
pub struct ExcelParser;

impl Parser for ExcelParser {
    fn parse(&self, path: &Path, options: &ReadOptions<'_>) -> Result<Table, LoadError> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| LoadError::malformed(path, "excel", e))?;

        let sheet_name = match options.sheet {
            Some(name) => name.to_string(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| LoadError::malformed(path, "excel", "workbook has no sheets"))?,
        };

        let range: Range<Data> = workbook.worksheet_range(&sheet_name).map_err(|e| {
            LoadError::malformed(path, "excel", format!("sheet '{}': {}", sheet_name, e))
        })?;

        parse_range(path, &range)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "xlsx" | "xls" | "ods" | "xlsm")
    }
}

fn parse_range(path: &Path, range: &Range<Data>) -> Result<Table, LoadError> {
    let mut rows = range.rows();

    // First row is header
    let header_row = rows
        .next()
        .ok_or_else(|| LoadError::malformed(path, "excel", "sheet is empty"))?;
    let names = dedupe_header(header_row.iter().map(header_text));

    let columns: Vec<Column> = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Column::new(name, i))
        .collect();
    let mut table = Table::new(columns);

    for (row_num, row) in rows.enumerate() {
        let cells = row.iter().map(convert_cell).collect();
        // +2 for 1-indexing and header
        table.add_row(cells, row_num + 2);
    }

    table.refresh_column_types();
    Ok(table)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::MISSING,
        Data::String(s) => CellValue::String(Cow::Owned(s.clone())),
        Data::Float(f) => {
            // Whole numbers are stored as floats by the file format
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => excel_datetime_cell(dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(Cow::Owned(s.clone())),
    }
}

/// Dates honour the workbook's 1900 or 1904 epoch; durations render as ISO 8601
fn excel_datetime_cell(dt: &ExcelDateTime) -> CellValue {
    let text = if dt.is_duration() {
        dt.as_duration().map(format_duration)
    } else {
        dt.as_datetime().map(format_datetime)
    };
    match text {
        Some(text) => CellValue::String(Cow::Owned(text)),
        None => CellValue::Float(dt.as_f64()),
    }
}

/// Dates without a time part render as `YYYY-MM-DD`
fn format_datetime(value: NaiveDateTime) -> String {
    if value.time().num_seconds_from_midnight() == 0 && value.time().nanosecond() == 0 {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

fn format_duration(value: Duration) -> String {
    let total = value.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    format!(
        "{}PT{}H{}M{}S",
        sign,
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use calamine::ExcelDateTimeType;

    use super::*;

    #[test]
    fn test_convert_cell() {
        assert!(convert_cell(&Data::Empty).is_missing_sentinel());
        assert_eq!(convert_cell(&Data::Float(3.0)), CellValue::Int(3));
        assert_eq!(convert_cell(&Data::Float(3.25)), CellValue::Float(3.25));
        assert_eq!(
            convert_cell(&Data::String("Sukamaju".into())),
            CellValue::from("Sukamaju")
        );
        assert_eq!(convert_cell(&Data::Bool(true)), CellValue::Bool(true));
    }

    #[test]
    fn test_serial_dates() {
        let date = ExcelDateTime::new(45292.0, ExcelDateTimeType::DateTime, false);
        assert_eq!(
            convert_cell(&Data::DateTime(date)),
            CellValue::from("2024-01-01")
        );

        let noon = ExcelDateTime::new(45292.5, ExcelDateTimeType::DateTime, false);
        assert_eq!(
            convert_cell(&Data::DateTime(noon)),
            CellValue::from("2024-01-01T12:00:00")
        );
    }

    #[test]
    fn test_1904_workbook_dates() {
        let epoch = ExcelDateTime::new(0.0, ExcelDateTimeType::DateTime, true);
        assert_eq!(
            convert_cell(&Data::DateTime(epoch)),
            CellValue::from("1904-01-01")
        );

        // Same serial, four years and a day apart between the two systems
        let date = ExcelDateTime::new(43830.0, ExcelDateTimeType::DateTime, true);
        assert_eq!(
            convert_cell(&Data::DateTime(date)),
            CellValue::from("2024-01-01")
        );
    }

    #[test]
    fn test_durations() {
        let span = ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false);
        assert_eq!(convert_cell(&Data::DateTime(span)), CellValue::from("PT36H0M0S"));
    }

    #[test]
    fn test_whole_floats_beyond_i64_stay_float() {
        let two_pow_63 = 9_223_372_036_854_775_808.0;
        assert_eq!(
            convert_cell(&Data::Float(two_pow_63)),
            CellValue::Float(two_pow_63)
        );
        assert_eq!(
            convert_cell(&Data::Float(i64::MIN as f64)),
            CellValue::Int(i64::MIN)
        );
    }

    #[test]
    fn test_range_to_table() {
        let mut range: Range<Data> = Range::new((0, 0), (2, 1));
        range.set_value((0, 0), Data::String("desa".into()));
        range.set_value((0, 1), Data::String("skor".into()));
        range.set_value((1, 0), Data::String("A".into()));
        range.set_value((1, 1), Data::Float(7.5));
        range.set_value((2, 0), Data::String("B".into()));

        let table = parse_range(Path::new("book.xlsx"), &range).unwrap();
        assert_eq!(table.column_names(), vec!["desa", "skor"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0].cells[1], CellValue::Float(7.5));
        assert!(table.rows[1].cells[1].is_missing_sentinel());
    }
}
