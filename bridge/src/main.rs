use anyhow::{Context, Result};
use api::{AppState, ServerConfig};
use clap::Parser;
use database::{Database, PostStore};
use posts::StorageProfile;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod config;
mod logging;

use config::BridgeConfig;

/// ArticlAI bridge - standalone REST bridge over a configurable post table
#[derive(Parser)]
#[command(name = "articlai-bridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = BridgeConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.api.port = port;
    }

    let _log_guard = logging::init_logging(&config.logging.dir)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("=== ArticlAI bridge starting ===");

    let database_path = config
        .storage
        .database_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    let db = Arc::new(Database::new(database_path).await?);

    let mut profile = StorageProfile::resolve(
        &config.storage.table,
        config.storage.banner.clone(),
        &config.storage.field_mapping,
    )?;
    profile.auto_generate_slug = config.content.auto_generate_slug;

    // Bootstrap the backing table and the unique slug index; both are
    // no-ops when the host table already exists
    db.execute_raw(&profile.create_table_sql()).await?;
    for sql in profile.index_sql() {
        db.execute_raw(&sql).await?;
    }

    let store = PostStore::open(db, profile)
        .await
        .context("Storage configuration is invalid")?;

    let state = AppState {
        store: Arc::new(store),
        auth: Arc::new(config.auth.clone()),
        content: Arc::new(config.content.clone()),
        platform: Arc::new(config.platform.clone()),
    };

    let server = ServerConfig {
        bind: config.api.bind.clone(),
        port: config.api.port,
        prefix: config.api.prefix.clone(),
    };

    api::start_server(state, server)
        .await
        .map_err(|e| anyhow::anyhow!("API server error: {}", e))?;

    info!("=== ArticlAI bridge shutdown complete ===");
    Ok(())
}
