//! Data model for tabular data representation

mod schema;
mod table;

pub use schema::{dedupe_header, CellType, Column};
pub use table::{CellValue, Row, Table};
