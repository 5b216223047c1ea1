//! Parley Daemon - keyword intent service with AI fallback.

use anyhow::{Context, Result};
use parley_common::{HttpFallbackClient, SqliteInteractionStore};
use parleyd::config::ServiceConfig;
use parleyd::server::{self, AppState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Parley Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    // Missing secrets stop us here, before any socket is bound
    let config = ServiceConfig::from_env().context("Invalid configuration")?;

    let store = SqliteInteractionStore::connect(&config.database_url)
        .context("Failed to open interaction store")?;
    let fallback = HttpFallbackClient::new(config.llm.clone(), config.api_key.clone())
        .context("Failed to create AI fallback client")?;
    info!("AI fallback: {} via {}", config.llm.model, config.llm.endpoint);

    let state = AppState::new(Arc::new(fallback), Arc::new(store));
    server::run(state, config.bind_addr).await
}
