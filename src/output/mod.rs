//! Output formatting for datasets

mod json;
mod summary;

pub use json::{cell_value_to_json, records, serialize, JsonOutput, Record};
pub use summary::{describe, render_routes, render_summary, DatasetInfo};
