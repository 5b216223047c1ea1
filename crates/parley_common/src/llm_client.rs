//! AI fallback client.
//!
//! Used only for text the keyword classifier cannot place. Every call starts a
//! fresh single-turn conversation with an OpenAI-compatible chat endpoint; the
//! underlying HTTP connection pool is shared, conversation state is not.
//! A fake client is provided for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// LLM provider settings (non-secret)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Optional system message prepended to each conversation
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_endpoint() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout(),
            system_prompt: None,
        }
    }
}

/// Fallback call failures. None of these are retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FallbackError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    #[error("invalid JSON response: {0}")]
    InvalidJson(String),
}

/// Source of free-form replies for unrecognised text
#[async_trait]
pub trait FallbackClient: Send + Sync {
    /// Send `text` as a new conversation and return the reply
    async fn reply(&self, text: &str) -> Result<String, FallbackError>;
}

/// Real client over HTTP
pub struct HttpFallbackClient {
    config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

impl HttpFallbackClient {
    pub fn new(config: LlmConfig, api_key: impl Into<String>) -> Result<Self, FallbackError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FallbackError::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_key: api_key.into(),
            client,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    fn request_body(&self, text: &str) -> Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.config.system_prompt {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": text}));

        serde_json::json!({
            "model": self.config.model,
            "messages": messages,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> FallbackError {
        if e.is_timeout() {
            FallbackError::Timeout(self.config.timeout_secs)
        } else {
            FallbackError::Http(format!("request failed: {}", e))
        }
    }
}

#[async_trait]
impl FallbackClient for HttpFallbackClient {
    async fn reply(&self, text: &str) -> Result<String, FallbackError> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FallbackError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        let json: Value = serde_json::from_str(&body)
            .map_err(|e| FallbackError::InvalidJson(format!("failed to parse response: {}", e)))?;

        Ok(extract_reply(&json))
    }
}

/// Pull the assistant text out of a chat completion. Replies without a text
/// payload are returned as their raw JSON rendering instead of failing.
pub fn extract_reply(json: &Value) -> String {
    match json
        .get("choices")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("message"))
        .and_then(|v| v.get("content"))
        .and_then(|v| v.as_str())
    {
        Some(text) => text.to_string(),
        None => {
            debug!("Fallback reply carried no text content, using raw reply");
            json.to_string()
        }
    }
}

/// Fake client for testing
pub struct FakeFallbackClient {
    responses: Mutex<Vec<Result<String, FallbackError>>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeFallbackClient {
    /// Create a fake client with pre-defined responses. The last one repeats.
    pub fn new(responses: Vec<Result<String, FallbackError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always_reply(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn always_error(error: FallbackError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.prompts().len()
    }

    /// Texts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl FallbackClient for FakeFallbackClient {
    async fn reply(&self, text: &str) -> Result<String, FallbackError> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(text.to_string());

        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        match responses.len() {
            0 => Err(FallbackError::Http("no fake response configured".into())),
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }
}
