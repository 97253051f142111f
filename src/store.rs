//! In-memory dataset store and route registry
//!
//! Every configured dataset is read once, normalized, and then only ever
//! shared read-only. Handlers borrow from the store; nothing writes to it
//! after construction, so no locking is involved.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{error, info};

use crate::config::{Config, DatasetSpec};
use crate::error::{ApiError, LoadError};
use crate::model::Table;
use crate::normalize::NullPolicy;
use crate::parser::{ParserFactory, ReadOptions};

/// One named, normalized, immutable table
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub source: PathBuf,
    pub table: Table,
    pub loaded_at: DateTime<Utc>,
}

impl Dataset {
    /// Wrap an in-memory table, normalizing it with `policy`
    pub fn from_table(
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        table: Table,
        policy: &NullPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            table: policy.normalize(table),
            loaded_at: Utc::now(),
        }
    }
}

/// Read and normalize one source file
pub fn load(
    name: &str,
    path: &Path,
    factory: &ParserFactory,
    options: &ReadOptions<'_>,
) -> Result<Dataset, LoadError> {
    let table = factory.parse(path, options)?;
    Ok(Dataset::from_table(name, path, table, options.null_policy))
}

/// State of a configured dataset after startup
#[derive(Debug, Clone)]
pub enum DatasetSlot {
    Ready(Arc<Dataset>),
    Unavailable { source: PathBuf, reason: String },
}

impl DatasetSlot {
    pub fn is_ready(&self) -> bool {
        matches!(self, DatasetSlot::Ready(_))
    }
}

/// All configured datasets, in configuration order
#[derive(Debug, Default, Clone)]
pub struct DatasetStore {
    slots: IndexMap<String, DatasetSlot>,
}

impl DatasetStore {
    /// Load every dataset in `config`.
    ///
    /// With `data.fail_fast` set, the first failure (in configuration
    /// order) is returned and nothing is served. Otherwise failed datasets
    /// are kept as [`DatasetSlot::Unavailable`].
    pub fn load(config: &Config) -> Result<Self, LoadError> {
        let results = Self::load_each(config);

        if config.data.fail_fast {
            let mut store = DatasetStore::default();
            for (name, result) in results {
                store.slots.insert(name, DatasetSlot::Ready(Arc::new(result?)));
            }
            return Ok(store);
        }

        Ok(Self::from_results(results))
    }

    /// Load every dataset, keeping failures as unavailable slots
    pub fn load_lenient(config: &Config) -> Self {
        Self::from_results(Self::load_each(config))
    }

    fn load_each(config: &Config) -> Vec<(String, Result<Dataset, LoadError>)> {
        let factory = ParserFactory::new();
        let policy = config.null_policy();
        let base_dir = &config.data.base_dir;

        config
            .datasets
            .par_iter()
            .map(|spec| {
                let path = spec.resolve_path(base_dir);
                let options = ReadOptions::new(&policy).with_sheet(spec.sheet.as_deref());
                let result = load(&spec.name, &path, &factory, &options);
                log_result(spec, &result);
                (spec.name.clone(), result)
            })
            .collect()
    }

    fn from_results(results: Vec<(String, Result<Dataset, LoadError>)>) -> Self {
        let slots = results
            .into_iter()
            .map(|(name, result)| {
                let slot = match result {
                    Ok(dataset) => DatasetSlot::Ready(Arc::new(dataset)),
                    Err(e) => DatasetSlot::Unavailable {
                        source: error_source(&e),
                        reason: e.to_string(),
                    },
                };
                (name, slot)
            })
            .collect();
        Self { slots }
    }

    /// Build a store from datasets already in memory
    pub fn from_datasets(datasets: impl IntoIterator<Item = Dataset>) -> Self {
        let slots = datasets
            .into_iter()
            .map(|d| (d.name.clone(), DatasetSlot::Ready(Arc::new(d))))
            .collect();
        Self { slots }
    }

    /// Register a dataset that could not be loaded
    pub fn with_unavailable(
        mut self,
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        self.slots.insert(
            name.into(),
            DatasetSlot::Unavailable {
                source: source.into(),
                reason: reason.into(),
            },
        );
        self
    }

    /// The ready dataset called `name`, or the error a caller should see
    pub fn dataset(&self, name: &str) -> Result<&Arc<Dataset>, ApiError> {
        match self.slots.get(name) {
            Some(DatasetSlot::Ready(dataset)) => Ok(dataset),
            Some(DatasetSlot::Unavailable { reason, .. }) => Err(ApiError::ServiceUnavailable {
                name: name.to_string(),
                reason: reason.clone(),
            }),
            None => Err(ApiError::NotFound(name.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DatasetSlot)> {
        self.slots.iter().map(|(name, slot)| (name.as_str(), slot))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of datasets that failed to load
    pub fn unavailable_count(&self) -> usize {
        self.slots.values().filter(|s| !s.is_ready()).count()
    }
}

fn log_result(spec: &DatasetSpec, result: &Result<Dataset, LoadError>) {
    match result {
        Ok(dataset) => info!(
            dataset = %spec.name,
            rows = dataset.table.row_count(),
            columns = dataset.table.column_count(),
            source = %dataset.source.display(),
            "dataset loaded"
        ),
        Err(e) => error!(dataset = %spec.name, error = %e, "dataset failed to load"),
    }
}

fn error_source(e: &LoadError) -> PathBuf {
    match e {
        LoadError::NotFound { path }
        | LoadError::Io { path, .. }
        | LoadError::Malformed { path, .. }
        | LoadError::UnsupportedFormat { path } => path.clone(),
    }
}

/// Static mapping from HTTP path to dataset name
#[derive(Debug, Default, Clone)]
pub struct RouteRegistry {
    routes: FxHashMap<String, String>,
    /// Registration order, for listing
    order: Vec<String>,
}

impl RouteRegistry {
    /// Primary route and aliases of every configured dataset
    pub fn from_config(config: &Config) -> Self {
        let mut registry = RouteRegistry::default();
        for spec in &config.datasets {
            registry.insert(spec.primary_route(&config.data.route_prefix), &spec.name);
            for alias in &spec.aliases {
                registry.insert(alias.clone(), &spec.name);
            }
        }
        registry
    }

    /// `{prefix}/{name}` for each dataset in `store`
    pub fn for_store(store: &DatasetStore, prefix: &str) -> Self {
        let mut registry = RouteRegistry::default();
        for (name, _) in store.iter() {
            registry.insert(format!("{}/{}", prefix.trim_end_matches('/'), name), name);
        }
        registry
    }

    /// Add a route; an existing path keeps its first target
    pub fn insert(&mut self, path: impl Into<String>, dataset: impl Into<String>) {
        let path = path.into();
        if !self.routes.contains_key(&path) {
            self.order.push(path.clone());
            self.routes.insert(path, dataset.into());
        }
    }

    /// Dataset served at `path`
    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.routes.get(path).map(String::as_str)
    }

    /// Routes in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .filter_map(|path| self.routes.get(path).map(|ds| (path.as_str(), ds.as_str())))
    }

    /// First registered route for `dataset`
    pub fn route_for(&self, dataset: &str) -> Option<&str> {
        self.iter().find(|(_, ds)| *ds == dataset).map(|(path, _)| path)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::model::CellValue;

    fn write_fixtures(dir: &Path) {
        fs::write(
            dir.join("cluster_tipologi.csv"),
            "desa,skor,kategori\nSukamaju,7.5,\nCibodas,6.0,Maju\n",
        )
        .unwrap();
        fs::write(dir.join("cluster_ekonomi.csv"), "desa,cluster\nA,1\nB,2\n").unwrap();
    }

    fn config_for(dir: &Path, names: &[&str]) -> Config {
        Config::default().with_base_dir(dir).with_datasets(
            names
                .iter()
                .map(|n| DatasetSpec::new(*n, format!("{}.csv", n)))
                .collect(),
        )
    }

    #[test]
    fn test_load_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());
        let policy = NullPolicy::default();

        let dataset = load(
            "cluster_tipologi",
            &dir.path().join("cluster_tipologi.csv"),
            &ParserFactory::new(),
            &ReadOptions::new(&policy),
        )
        .unwrap();

        assert_eq!(dataset.table.rows[0].cells[2], CellValue::Null);
        assert_eq!(dataset.table.rows[0].cells[1], CellValue::Float(7.5));
    }

    #[test]
    fn test_store_keeps_config_order() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let store =
            DatasetStore::load(&config_for(dir.path(), &["cluster_tipologi", "cluster_ekonomi"]))
                .unwrap();

        let names: Vec<_> = store.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["cluster_tipologi", "cluster_ekonomi"]);
        assert_eq!(store.unavailable_count(), 0);
    }

    #[test]
    fn test_fail_fast_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let config = config_for(dir.path(), &["cluster_tipologi", "cluster_digital"]);
        let err = DatasetStore::load(&config).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn test_lenient_load_marks_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let config =
            config_for(dir.path(), &["cluster_tipologi", "cluster_digital"]).with_fail_fast(false);
        let store = DatasetStore::load(&config).unwrap();

        assert!(store.dataset("cluster_tipologi").is_ok());
        assert!(matches!(
            store.dataset("cluster_digital"),
            Err(ApiError::ServiceUnavailable { .. })
        ));
        assert!(matches!(
            store.dataset("cluster_unknown"),
            Err(ApiError::NotFound(_))
        ));
        assert_eq!(store.unavailable_count(), 1);
    }

    #[test]
    fn test_registry_from_default_config() {
        let registry = RouteRegistry::from_config(&Config::default());

        assert_eq!(registry.len(), 8);
        assert_eq!(
            registry.resolve("/api/data_cluster/cluster_pendidikan"),
            Some("cluster_pendidikan")
        );
        assert_eq!(registry.resolve("/api/tipologi-desa"), Some("cluster_tipologi"));
        assert_eq!(registry.resolve("/api/data_cluster/cluster_unknown"), None);
        assert_eq!(
            registry.route_for("cluster_tipologi"),
            Some("/api/data_cluster/cluster_tipologi")
        );
    }
}
