//! Dataset summaries for the index endpoint and the `check` command

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::settings::Style;
use tabled::Tabled;

use crate::store::{DatasetSlot, DatasetStore, RouteRegistry};

/// Description of one configured dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetInfo {
    pub name: String,
    pub route: Option<String>,
    pub source: String,
    pub status: &'static str,
    pub rows: usize,
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Describe every dataset in the store, in configuration order
pub fn describe(store: &DatasetStore, registry: &RouteRegistry) -> Vec<DatasetInfo> {
    store
        .iter()
        .map(|(name, slot)| {
            let route = registry.route_for(name).map(str::to_string);
            match slot {
                DatasetSlot::Ready(dataset) => DatasetInfo {
                    name: name.to_string(),
                    route,
                    source: dataset.source.display().to_string(),
                    status: "ready",
                    rows: dataset.table.row_count(),
                    columns: dataset
                        .table
                        .column_names()
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                    loaded_at: Some(dataset.loaded_at),
                    error: None,
                },
                DatasetSlot::Unavailable { source, reason } => DatasetInfo {
                    name: name.to_string(),
                    route,
                    source: source.display().to_string(),
                    status: "unavailable",
                    rows: 0,
                    columns: Vec::new(),
                    loaded_at: None,
                    error: Some(reason.clone()),
                },
            }
        })
        .collect()
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "dataset")]
    name: String,
    route: String,
    status: String,
    rows: usize,
    columns: usize,
    source: String,
}

/// Render dataset descriptions as a text table
pub fn render_summary(infos: &[DatasetInfo]) -> String {
    let rows: Vec<SummaryRow> = infos
        .iter()
        .map(|info| SummaryRow {
            name: info.name.clone(),
            route: info.route.clone().unwrap_or_else(|| "-".to_string()),
            status: match &info.error {
                Some(e) => format!("{}: {}", info.status, e),
                None => info.status.to_string(),
            },
            rows: info.rows,
            columns: info.columns.len(),
            source: info.source.clone(),
        })
        .collect();

    let mut table = tabled::Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Render the route registry as a text table
pub fn render_routes(registry: &RouteRegistry) -> String {
    #[derive(Tabled)]
    struct RouteRow {
        path: String,
        dataset: String,
    }

    let rows: Vec<RouteRow> = registry
        .iter()
        .map(|(path, dataset)| RouteRow {
            path: path.to_string(),
            dataset: dataset.to_string(),
        })
        .collect();

    let mut table = tabled::Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}
