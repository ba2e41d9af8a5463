use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod catalog;
mod catalog_store;
mod config;
mod derived_id;
mod server;

use catalog_store::{CatalogStore, SqliteCatalogStore};
use config::FileConfig;
use server::{run_server, RequestsLoggingLevel, ServerConfig};

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
    /// Path to the SQLite catalog database file. Created if missing.
    #[clap(value_parser = parse_path)]
    pub catalog_db: PathBuf,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Root prefix for the hyperlink strings in entity representations.
    #[clap(long, default_value = "?")]
    pub link_root: String,

    /// Path to an optional TOML config file; its values override CLI args.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

fn resolve_config(cli_args: &CliArgs) -> Result<ServerConfig> {
    let file_config = match &cli_args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let requests_logging_level = match file_config.logging_level {
        Some(level) => {
            clap::ValueEnum::from_str(&level, true).map_err(anyhow::Error::msg)?
        }
        None => cli_args.logging_level.clone(),
    };

    Ok(ServerConfig {
        requests_logging_level,
        port: file_config.port.unwrap_or(cli_args.port),
        link_root: file_config.link_root.unwrap_or_else(|| cli_args.link_root.clone()),
    })
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
        .unwrap();

    let config = resolve_config(&cli_args)?;

    info!("Opening catalog database at {:?}...", cli_args.catalog_db);
    let store = Arc::new(SqliteCatalogStore::new(
        &cli_args.catalog_db,
        &config.link_root,
    )?);
    info!(
        "Catalog has {} artists, {} albums, {} tracks",
        store.get_artists_count(),
        store.get_albums_count(),
        store.get_tracks_count()
    );

    info!("Ready to serve at port {}!", config.port);
    run_server(store, config).await
}
