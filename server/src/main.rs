use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keystone::AppState;
use keystone::database::sqlite::SqliteIdentityStore;
use keystone::server;
use shared::config::load_config;

/// Role-based access control and session-claims server.
#[derive(Debug, Parser)]
#[command(name = "keystone", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Override the configured listen port.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let store = SqliteIdentityStore::connect(
        &config.database.url,
        config.database.max_connections,
    )
    .await
    .context("Failed to open identity store")?;
    store.init().await.context("Failed to initialise schema")?;

    let addr = config.server.addr();
    let state = AppState::new(config, Arc::new(store))?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("keystone {} starting", env!("CARGO_PKG_VERSION"));

    server::run(listener, state).await
}
