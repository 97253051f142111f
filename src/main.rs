//! clusterdesa - read-only JSON API over village clustering tables

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use clusterdesa::config::Config;
use clusterdesa::output::{describe, render_routes, render_summary, JsonOutput};
use clusterdesa::server::{self, AppState};
use clusterdesa::store::{DatasetStore, RouteRegistry};

/// Serve pre-computed village clustering tables as JSON
#[derive(Parser, Debug)]
#[command(name = "clusterdesa")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (TOML); defaults to ./clusterdesa.toml when present
    #[arg(short, long, env = "CLUSTERDESA_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the dataset files
    #[arg(long, env = "CLUSTERDESA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "CLUSTERDESA_HOST")]
    host: Option<String>,

    /// Port to bind
    #[arg(short, long, env = "CLUSTERDESA_PORT")]
    port: Option<u16>,

    /// Log filter (e.g. info, debug); RUST_LOG takes precedence
    #[arg(long, env = "CLUSTERDESA_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load every dataset and serve it over HTTP (default)
    Serve,
    /// Load every dataset and report which ones are usable
    Check,
    /// Print the route table
    Routes,
    /// Print one dataset exactly as its route serves it
    Dump {
        /// Dataset name
        name: String,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether the command succeeded
fn run() -> Result<bool> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            clusterdesa::logging::init_logging(&config.logging)?;
            actix_web::rt::System::new().block_on(serve(config))?;
            Ok(true)
        }
        Command::Check => {
            let store = DatasetStore::load_lenient(&config);
            let registry = RouteRegistry::from_config(&config);
            println!("{}", render_summary(&describe(&store, &registry)));
            Ok(store.unavailable_count() == 0)
        }
        Command::Routes => {
            println!("{}", render_routes(&RouteRegistry::from_config(&config)));
            Ok(true)
        }
        Command::Dump { name, pretty } => {
            let spec = config
                .datasets
                .iter()
                .find(|d| d.name == name)
                .with_context(|| format!("No dataset named '{}' is configured", name))?;
            let store = DatasetStore::load(&config.clone().with_datasets(vec![spec.clone()]))?;
            let dataset = store.dataset(&name)?;

            let output = if pretty {
                JsonOutput::new()
            } else {
                JsonOutput::compact()
            };
            let mut stdout = std::io::stdout().lock();
            output.render(&dataset.table, &mut stdout)?;
            writeln!(stdout)?;
            Ok(true)
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(dir) = &cli.data_dir {
        config.data.base_dir = dir.clone();
    }
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn serve(config: Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        datasets = config.datasets.len(),
        base_dir = %config.data.base_dir.display(),
        "clusterdesa starting"
    );

    let store = match DatasetStore::load(&config) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "startup aborted: dataset failed to load");
            return Err(e).context("Failed to load datasets");
        }
    };

    if store.unavailable_count() > 0 {
        tracing::warn!(
            unavailable = store.unavailable_count(),
            "serving with unavailable datasets"
        );
    }

    let state = AppState::from_config(&config, store);
    server::run(&config, state)
        .await
        .context("HTTP server failed")
}
