//! Request-level errors and their HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parley_common::{ErrorResponse, FallbackError, StoreError};
use tracing::warn;

/// Failure of the process pipeline after the payload was accepted
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("AI service error: {0}")]
    Fallback(#[from] FallbackError),

    /// The underlying store error is logged, not returned to the client
    #[error("Failed to store the interaction")]
    Store(#[from] StoreError),
}

impl ProcessError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Fallback(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProcessError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Any unusable request body is a validation failure (422)
pub fn payload_rejection(rejection: JsonRejection) -> Response {
    let detail = rejection.body_text();
    warn!("Rejected payload: {}", detail);
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse { detail }),
    )
        .into_response()
}
