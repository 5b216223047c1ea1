//! API routes for parleyd

use crate::error::payload_rejection;
use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parley_common::{HealthResponse, ProcessRequest};
use std::sync::Arc;
use tracing::warn;

type AppStateArc = Arc<AppState>;

// ============================================================================
// Process Routes
// ============================================================================

pub fn process_routes() -> Router<AppStateArc> {
    Router::new().route("/process", post(process_text))
}

/// Detect intent, fall back to AI if needed, and store the interaction
async fn process_text(
    State(state): State<AppStateArc>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return payload_rejection(rejection),
    };

    match state.handler.handle(&req.text).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    }
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    let interactions_stored = match state.handler.store().count().await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!("Health check could not count interactions: {}", e);
            None
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        interactions_stored,
    })
}
