//! clusterdesa - read-only JSON API over village clustering tables
//!
//! Pre-computed cluster tables (typology, infrastructure, health, digital,
//! economic, environmental, education) are loaded once at startup from
//! tabular files (CSV, Excel, Parquet, JSON), their missing values
//! normalized to `null`, and each table served whole at its own GET route.

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod server;
pub mod store;

pub use config::Config;
pub use error::{ApiError, ConfigError, LoadError};
pub use model::Table;
pub use normalize::NullPolicy;
pub use store::{Dataset, DatasetStore, RouteRegistry};
