use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shelf_catalog_server::collection_store::{CollectionStore, SqliteCollectionStore};
use shelf_catalog_server::config::{AppConfig, CliConfig, FileConfig};
use shelf_catalog_server::server::{
    self, run_server, RequestsLoggingLevel, ServerConfig, SharedPasswordGate,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding collection.db. Created databases are initialized
    /// with the latest schema.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Optional TOML config file. Values in it override the CLI.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Password required in the X-Admin-Password header to export the
    /// collection.
    #[clap(long, env = "SHELF_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };

    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        frontend_dir_path: cli_args.frontend_dir_path,
        admin_password: cli_args.admin_password,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let db_path = config.collection_db_path();
    info!("Opening SQLite collection database at {:?}...", db_path);
    let collection_store = Arc::new(SqliteCollectionStore::new(&db_path)?);

    info!("Initializing metrics...");
    server::metrics::init_metrics();
    let counts = collection_store.counts()?;
    server::metrics::set_collection_counts(counts.physical_items, counts.media, counts.links);

    if config.admin_password.is_none() {
        warn!("No admin password configured, collection export is disabled");
    }
    let auth_gate = Arc::new(SharedPasswordGate::new(config.admin_password.clone()));

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level,
        port: config.port,
        frontend_dir_path: config.frontend_dir_path,
        settings: config.settings,
    };

    info!("Ready to serve at port {}!", server_config.port);
    run_server(server_config, collection_store, auth_gate).await
}
