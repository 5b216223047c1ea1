//! HTTP server for parleyd

use crate::handlers::InteractionHandler;
use crate::middleware::log_requests;
use crate::routes;
use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, middleware, Router};
use parley_common::{FallbackClient, InteractionStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{info, Level};

/// Application state shared across handlers
pub struct AppState {
    pub handler: InteractionHandler,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(fallback: Arc<dyn FallbackClient>, store: Arc<dyn InteractionStore>) -> Self {
        Self {
            handler: InteractionHandler::new(fallback, store),
            start_time: Instant::now(),
        }
    }
}

/// Build the router with all routes and layers
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::process_routes())
        .merge(routes::health_routes())
        .with_state(Arc::new(state))
        // Utterance length is unbounded
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn(log_requests))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(Level::DEBUG)))
}

/// Run the HTTP server until Ctrl-C or SIGTERM
pub async fn run(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down gracefully");
}
