//! Interaction record: one per processed request, written once.

use crate::intent::Intent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted record of a single request/response pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Original input text
    pub text: String,
    pub intent: Intent,
    /// Only set when the fallback ran and succeeded
    pub ai_response: Option<String>,
    /// UTC creation time
    pub timestamp: DateTime<Utc>,
}

impl Interaction {
    /// Build a record stamped with the current UTC time
    pub fn new(text: impl Into<String>, intent: Intent, ai_response: Option<String>) -> Self {
        Self {
            text: text.into(),
            intent,
            ai_response,
            timestamp: Utc::now(),
        }
    }
}
