//! Configuration handling for clusterdesa
//!
//! Everything has a default, so the service starts with no config file at
//! all and serves the seven standard cluster tables from `./data/data_cluster`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::normalize::NullPolicy;

/// Dataset names served when no `[[datasets]]` are configured
pub const DEFAULT_DATASETS: &[&str] = &[
    "cluster_tipologi",
    "cluster_infrastruktur",
    "cluster_kesehatan",
    "cluster_digital",
    "cluster_ekonomi",
    "cluster_lingkungan",
    "cluster_pendidikan",
];

/// Path the dashboard's overview page used before the per-cluster routes existed
pub const LEGACY_TIPOLOGI_ROUTE: &str = "/api/tipologi-desa";

/// Liveness route served next to the datasets
pub const HEALTH_ROUTE: &str = "/healthz";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub data: DataSettings,
    pub missing: MissingSettings,
    pub cors: CorsSettings,
    pub logging: LoggingSettings,
    pub datasets: Vec<DatasetSpec>,
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Worker threads; 0 keeps the HTTP server's default (one per core)
    pub workers: usize,
}

/// Where datasets live and how they are exposed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Base directory for relative dataset paths
    pub base_dir: PathBuf,
    /// Prefix for per-dataset routes
    pub route_prefix: String,
    /// Abort startup when any dataset fails to load
    pub fail_fast: bool,
}

/// Missing-value tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissingSettings {
    /// Include the standard set (`""`, `NA`, `NaN`, `null`, ...)
    pub use_default_tokens: bool,
    /// Additional tokens to treat as missing
    pub extra_tokens: Vec<String>,
}

/// Cross-origin policy applied to every route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    /// `["*"]` (or empty) allows any origin
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    /// Preflight cache lifetime in seconds
    pub max_age: usize,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive (`RUST_LOG` wins when set)
    pub level: String,
    /// `compact` or `json`
    pub format: String,
}

/// One served table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    /// Dataset name; also the last route segment
    pub name: String,
    /// Source file, relative to `data.base_dir` unless absolute
    pub path: PathBuf,
    /// Full route path overriding `{route_prefix}/{name}`
    #[serde(default)]
    pub route: Option<String>,
    /// Extra paths serving the same dataset
    #[serde(default)]
    pub aliases: Vec<String>,
    /// For workbooks: which sheet to read
    #[serde(default)]
    pub sheet: Option<String>,
}

impl DatasetSpec {
    /// Create a spec with a name and source path
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            route: None,
            aliases: Vec::new(),
            sheet: None,
        }
    }

    /// Add an alias route
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Override the primary route
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Primary route for this dataset under `prefix`
    pub fn primary_route(&self, prefix: &str) -> String {
        match &self.route {
            Some(route) => route.clone(),
            None => format!("{}/{}", prefix.trim_end_matches('/'), self.name),
        }
    }

    /// Resolve the source path against `base_dir`
    pub fn resolve_path(&self, base_dir: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            base_dir.join(&self.path)
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            workers: 0,
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./data/data_cluster"),
            route_prefix: "/api/data_cluster".to_string(),
            fail_fast: true,
        }
    }
}

impl Default for MissingSettings {
    fn default() -> Self {
        Self {
            use_default_tokens: true,
            extra_tokens: Vec::new(),
        }
    }
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["*".to_string()],
            allowed_headers: vec!["*".to_string()],
            allow_credentials: true,
            max_age: 3600,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            data: DataSettings::default(),
            missing: MissingSettings::default(),
            cors: CorsSettings::default(),
            logging: LoggingSettings::default(),
            datasets: default_datasets(),
        }
    }
}

/// The seven cluster tables, each read from `<name>.csv`
pub fn default_datasets() -> Vec<DatasetSpec> {
    DEFAULT_DATASETS
        .iter()
        .map(|name| {
            let spec = DatasetSpec::new(*name, format!("{}.csv", name));
            if *name == "cluster_tipologi" {
                spec.with_alias(LEGACY_TIPOLOGI_ROUTE)
            } else {
                spec
            }
        })
        .collect()
}

impl Config {
    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

        // A file that only tunes settings still serves the standard tables
        if config.datasets.is_empty() {
            config.datasets = default_datasets();
        }

        Ok(config)
    }

    /// Load a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load `path` if given, else `clusterdesa.toml` if present, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let implicit = Path::new("clusterdesa.toml");
                if implicit.exists() {
                    Self::from_file(implicit)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Set the data directory
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data.base_dir = dir.into();
        self
    }

    /// Replace the dataset list
    pub fn with_datasets(mut self, datasets: Vec<DatasetSpec>) -> Self {
        self.datasets = datasets;
        self
    }

    /// Set startup failure handling
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.data.fail_fast = fail_fast;
        self
    }

    /// Missing-value policy described by `[missing]`
    pub fn null_policy(&self) -> NullPolicy {
        NullPolicy::new(
            self.missing.use_default_tokens,
            self.missing.extra_tokens.iter().cloned(),
        )
    }

    /// Check names and routes are consistent
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }

        let mut names = rustc_hash::FxHashSet::default();
        let mut routes = rustc_hash::FxHashMap::default();

        for spec in &self.datasets {
            if spec.name.trim().is_empty() {
                return Err(ConfigError::Invalid("dataset name must not be empty".into()));
            }
            if !names.insert(spec.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "dataset '{}' is configured twice",
                    spec.name
                )));
            }

            let primary = spec.primary_route(&self.data.route_prefix);
            for route in std::iter::once(&primary).chain(spec.aliases.iter()) {
                if !route.starts_with('/') {
                    return Err(ConfigError::Invalid(format!(
                        "route '{}' for dataset '{}' must start with '/'",
                        route, spec.name
                    )));
                }
                if *route == self.data.route_prefix || route == HEALTH_ROUTE {
                    return Err(ConfigError::Invalid(format!(
                        "route '{}' for dataset '{}' is reserved for the index or health check",
                        route, spec.name
                    )));
                }
                if let Some(other) = routes.insert(route.clone(), spec.name.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "route '{}' is claimed by both '{}' and '{}'",
                        route, other, spec.name
                    )));
                }
            }
        }

        Ok(())
    }
}
