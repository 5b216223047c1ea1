//! Wire types shared by the daemon and the CLI.

use crate::intent::Intent;
use serde::{Deserialize, Serialize};

/// Message returned on every successful `/process` call
pub const PROCESSED_MESSAGE: &str = "Interaction processed successfully";

/// `POST /process` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub text: String,
}

/// `POST /process` success body. `ai_response` is always serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub intent: Intent,
    pub message: String,
    pub ai_response: Option<String>,
}

impl ProcessResponse {
    pub fn new(intent: Intent, ai_response: Option<String>) -> Self {
        Self {
            intent,
            message: PROCESSED_MESSAGE.to_string(),
            ai_response,
        }
    }
}

/// Error body for 4xx/5xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// `GET /health` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// None when the store could not be counted
    pub interactions_stored: Option<u64>,
}
