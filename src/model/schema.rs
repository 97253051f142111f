//! Column metadata and type information

use serde::{Deserialize, Serialize};

/// Inferred cell type for a column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    #[default]
    Null,
    Bool,
    Int,
    Float,
    String,
}

impl CellType {
    /// Widen the type to accommodate another type.
    ///
    /// Integers and floats meet at `Float`; any other disagreement falls
    /// back to `String`, which every value can be read as.
    pub fn widen(self, other: CellType) -> CellType {
        if self == other {
            return self;
        }

        match (self, other) {
            (CellType::Null, t) | (t, CellType::Null) => t,
            (CellType::Int, CellType::Float) | (CellType::Float, CellType::Int) => CellType::Float,
            _ => CellType::String,
        }
    }
}

impl std::fmt::Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellType::Null => write!(f, "null"),
            CellType::Bool => write!(f, "bool"),
            CellType::Int => write!(f, "int"),
            CellType::Float => write!(f, "float"),
            CellType::String => write!(f, "string"),
        }
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (from header)
    pub name: String,
    /// Column index (0-based position)
    pub index: usize,
    /// Type observed across the column's present values
    pub inferred_type: CellType,
}

impl Column {
    /// Create a new column with name and index
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            inferred_type: CellType::Null,
        }
    }

    /// Create a column with a specified type
    pub fn with_type(name: impl Into<String>, index: usize, cell_type: CellType) -> Self {
        Self {
            name: name.into(),
            index,
            inferred_type: cell_type,
        }
    }
}

/// Turn raw header names into unique, non-empty column names.
///
/// Blank names become `Unnamed: {index}`; repeats get a `.1`, `.2`, ...
/// suffix in order of appearance.
pub fn dedupe_header<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = rustc_hash::FxHashSet::default();
    let mut out = Vec::new();

    for (i, raw) in names.into_iter().enumerate() {
        let base = if raw.as_ref().trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            raw.as_ref().to_string()
        };

        let mut name = base.clone();
        let mut n = 1;
        while !seen.insert(name.clone()) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        out.push(name);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widen() {
        assert_eq!(CellType::Null.widen(CellType::Int), CellType::Int);
        assert_eq!(CellType::Int.widen(CellType::Float), CellType::Float);
        assert_eq!(CellType::Bool.widen(CellType::Int), CellType::String);
        assert_eq!(CellType::Float.widen(CellType::String), CellType::String);
        assert_eq!(CellType::Bool.widen(CellType::Null), CellType::Bool);
    }

    #[test]
    fn test_dedupe_header() {
        let names = dedupe_header(["desa", "", "skor", "skor", "skor"]);
        assert_eq!(names, vec!["desa", "Unnamed: 1", "skor", "skor.1", "skor.2"]);
    }
}
