//! CSV file parser

use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::LoadError;
use crate::model::{dedupe_header, CellType, CellValue, Column, Table};

use super::{Parser, ReadOptions};

/// Parser for CSV (and tab-separated) files
pub struct CsvParser;

impl Parser for CsvParser {
    fn parse(&self, path: &Path, options: &ReadOptions<'_>) -> Result<Table, LoadError> {
        let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
            _ => b',',
        };

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(BufReader::new(file));

        let headers = csv_reader
            .headers()
            .map_err(|e| LoadError::malformed(path, "csv", e))?
            .clone();

        if headers.is_empty() {
            return Err(LoadError::malformed(path, "csv", "no header row"));
        }

        let names = dedupe_header(headers.iter().map(|h| h.trim_start_matches('\u{feff}')));
        let width = names.len();

        // Raw text first; typing is decided per column once every value is known
        let mut raw_rows: Vec<(usize, Vec<Option<String>>)> = Vec::new();
        for (row_num, result) in csv_reader.records().enumerate() {
            let record = result.map_err(|e| LoadError::malformed(path, "csv", e))?;
            // +2 for 1-indexing and header
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(row_num + 2);

            if record.len() > width {
                return Err(LoadError::malformed(
                    path,
                    "csv",
                    format!("line {}: expected {} fields, saw {}", line, width, record.len()),
                ));
            }

            let fields = record
                .iter()
                .map(|field| {
                    if options.null_policy.is_missing(field) {
                        None
                    } else {
                        Some(field.to_string())
                    }
                })
                .collect();
            raw_rows.push((line, fields));
        }

        let column_types: Vec<CellType> = (0..width)
            .map(|col| {
                raw_rows
                    .iter()
                    .filter_map(|(_, fields)| fields.get(col).and_then(|f| f.as_deref()))
                    .fold(CellType::Null, |acc, raw| acc.widen(classify(raw)))
            })
            .collect();

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column::with_type(name, i, column_types[i]))
            .collect();
        let mut table = Table::new(columns);

        for (line, fields) in raw_rows {
            let cells = fields
                .into_iter()
                .zip(&column_types)
                .map(|(field, ty)| match field {
                    Some(raw) => convert(raw, *ty),
                    None => CellValue::MISSING,
                })
                .collect();
            table.add_row(cells, line);
        }

        Ok(table)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "csv" | "tsv" | "txt")
    }
}

/// Narrowest type a single present value could be read as
fn classify(raw: &str) -> CellType {
    let trimmed = raw.trim();

    if trimmed.parse::<i64>().is_ok() || trimmed.parse::<u64>().is_ok() {
        return CellType::Int;
    }
    // Text such as "inf" or "NAN" parses as a float but is kept verbatim
    if trimmed.parse::<f64>().is_ok_and(f64::is_finite) {
        return CellType::Float;
    }
    if parse_bool(trimmed).is_some() {
        return CellType::Bool;
    }

    CellType::String
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Read a present value as the column's type
fn convert(raw: String, ty: CellType) -> CellValue {
    let trimmed = raw.trim();
    let typed = match ty {
        CellType::Int => match trimmed.parse::<i64>() {
            Ok(i) => Some(CellValue::Int(i)),
            Err(_) => trimmed.parse::<u64>().ok().map(CellValue::from_u64),
        },
        CellType::Float => trimmed.parse::<f64>().ok().map(CellValue::Float),
        CellType::Bool => parse_bool(trimmed).map(CellValue::Bool),
        CellType::String | CellType::Null => None,
    };

    typed.unwrap_or(CellValue::String(Cow::Owned(raw)))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::normalize::NullPolicy;

    fn parse_str(contents: &str, ext: &str) -> Result<Table, LoadError> {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{}", ext))
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let policy = NullPolicy::default();
        CsvParser.parse(file.path(), &ReadOptions::new(&policy))
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("42"), CellType::Int);
        assert_eq!(classify(" 7.5 "), CellType::Float);
        assert_eq!(classify("True"), CellType::Bool);
        assert_eq!(classify("yes"), CellType::String);
        assert_eq!(classify("inf"), CellType::String);
        assert_eq!(classify("Sukamaju"), CellType::String);
    }

    #[test]
    fn test_column_level_typing() {
        let table = parse_str("desa,skor,cluster\nA,7,1\nB,7.5,2\nC,,x\n", "csv").unwrap();

        assert_eq!(table.columns[1].inferred_type, CellType::Float);
        assert_eq!(table.rows[0].cells[1], CellValue::Float(7.0));
        assert_eq!(table.rows[1].cells[1], CellValue::Float(7.5));
        assert!(table.rows[2].cells[1].is_missing_sentinel());

        // Mixed numbers and text stay text
        assert_eq!(table.columns[2].inferred_type, CellType::String);
        assert_eq!(table.rows[0].cells[2], CellValue::from("1"));
    }

    #[test]
    fn test_short_rows_padded_long_rows_rejected() {
        let table = parse_str("a,b,c\n1,2\n", "csv").unwrap();
        assert_eq!(table.rows[0].cells.len(), 3);
        assert!(table.rows[0].cells[2].is_missing_sentinel());

        let err = parse_str("a,b\n1,2,3\n", "csv").unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_header_cleanup() {
        let table = parse_str("\u{feff}desa,,desa\nA,1,B\n", "csv").unwrap();
        assert_eq!(table.column_names(), vec!["desa", "Unnamed: 1", "desa.1"]);
    }

    #[test]
    fn test_tab_separated() {
        let table = parse_str("desa\tskor\nA\t3\n", "tsv").unwrap();
        assert_eq!(table.column_names(), vec!["desa", "skor"]);
        assert_eq!(table.rows[0].cells[1], CellValue::Int(3));
    }

    #[test]
    fn test_empty_file_is_malformed() {
        let err = parse_str("", "csv").unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn test_large_unsigned_column_stays_integral() {
        let table = parse_str("id\n18446744073709551615\n12\n", "csv").unwrap();
        assert_eq!(table.rows[0].cells[0], CellValue::UInt(u64::MAX));
        assert_eq!(table.rows[1].cells[0], CellValue::Int(12));
    }

    #[test]
    fn test_strings_kept_verbatim() {
        let table = parse_str("nama\n  Desa Maju \n", "csv").unwrap();
        assert_eq!(table.rows[0].cells[0], CellValue::from("  Desa Maju "));
    }
}
