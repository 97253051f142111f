//! Missing-value detection and normalization
//!
//! Readers mark missing cells with [`CellValue::MISSING`]. Before a table is
//! served, [`NullPolicy::normalize`] collapses that sentinel and any
//! missing-value token that survived as text into a single `Null`.

use rustc_hash::FxHashSet;

use crate::model::{CellValue, Table};

/// Tokens treated as missing when they make up a whole field
pub const DEFAULT_MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Decides which raw values count as missing
#[derive(Debug, Clone)]
pub struct NullPolicy {
    tokens: FxHashSet<String>,
}

impl Default for NullPolicy {
    fn default() -> Self {
        Self::new(true, std::iter::empty::<String>())
    }
}

impl NullPolicy {
    /// Build a policy from the default token set (optional) plus extras
    pub fn new<I, S>(use_defaults: bool, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens: FxHashSet<String> = FxHashSet::default();
        if use_defaults {
            tokens.extend(DEFAULT_MISSING_TOKENS.iter().map(|t| t.to_string()));
        }
        tokens.extend(extra.into_iter().map(Into::into));
        Self { tokens }
    }

    /// Check whether a raw field is a missing-value token
    pub fn is_missing(&self, raw: &str) -> bool {
        self.tokens.contains(raw)
    }

    /// Collapse every form of "missing" in `table` to `Null`.
    ///
    /// Present values are left exactly as they are. Running this twice is
    /// the same as running it once.
    pub fn normalize(&self, mut table: Table) -> Table {
        for row in &mut table.rows {
            for cell in &mut row.cells {
                if self.is_missing_cell(cell) {
                    *cell = CellValue::Null;
                }
            }
        }
        table.refresh_column_types();
        table
    }

    fn is_missing_cell(&self, cell: &CellValue) -> bool {
        match cell {
            CellValue::Float(f) => f.is_nan(),
            CellValue::String(s) => self.is_missing(s),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellType;

    fn sample() -> Table {
        Table::from_rows(
            &["desa", "skor", "kategori"],
            vec![
                vec!["Sukamaju".into(), CellValue::Float(7.5), "".into()],
                vec!["Cibodas".into(), CellValue::MISSING, "NA".into()],
                vec!["Mekarsari".into(), CellValue::Float(6.0), "Maju".into()],
            ],
        )
    }

    #[test]
    fn test_missing_forms_collapse_to_null() {
        let table = NullPolicy::default().normalize(sample());

        assert_eq!(table.rows[0].cells[2], CellValue::Null);
        assert_eq!(table.rows[1].cells[1], CellValue::Null);
        assert_eq!(table.rows[1].cells[2], CellValue::Null);
        assert_eq!(table.rows[2].cells[2], CellValue::from("Maju"));
        assert_eq!(table.rows[0].cells[1], CellValue::Float(7.5));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let policy = NullPolicy::default();
        let once = policy.normalize(sample());
        let twice = policy.normalize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_present_values_untouched() {
        let table = Table::from_rows(
            &["a", "b", "c"],
            vec![vec![CellValue::Int(0), CellValue::Bool(false), " NA ".into()]],
        );
        let normalized = NullPolicy::default().normalize(table.clone());
        assert_eq!(normalized.rows, table.rows);
    }

    #[test]
    fn test_column_types_refreshed() {
        let table = NullPolicy::default().normalize(sample());
        assert_eq!(table.columns[1].inferred_type, CellType::Float);
        assert_eq!(table.columns[2].inferred_type, CellType::String);
    }

    #[test]
    fn test_custom_tokens() {
        let policy = NullPolicy::new(false, ["-"]);
        assert!(policy.is_missing("-"));
        assert!(!policy.is_missing(""));
        assert!(!policy.is_missing("NA"));
    }
}
