//! Configuration management for parleyd.
//!
//! Secrets (`DATABASE_URL`, `AI_API_KEY`) come from the environment only.
//! Everything else is read from an optional TOML file, then selectively
//! overridden by environment variables. Missing secrets are fatal at startup.

use parley_common::LlmConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;

/// System config file path
pub const CONFIG_PATH: &str = "/etc/parley/config.toml";

/// Env var naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "PARLEY_CONFIG";

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const API_KEY_ENV: &str = "AI_API_KEY";
pub const BIND_ADDR_ENV: &str = "PARLEY_BIND_ADDR";
pub const LLM_ENDPOINT_ENV: &str = "PARLEY_LLM_ENDPOINT";
pub const LLM_MODEL_ENV: &str = "PARLEY_LLM_MODEL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not found in environment variables")]
    Missing(&'static str),

    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid bind address '{0}'")]
    InvalidBindAddr(String),
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Contents of the TOML config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Fully resolved runtime configuration
#[derive(Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub llm: LlmConfig,
    pub database_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("bind_addr", &self.bind_addr)
            .field("llm", &self.llm)
            .field("database_url", &self.database_url)
            .field("api_key", &"***")
            .finish()
    }
}

impl ServiceConfig {
    /// Load from the process environment and the config file it points at
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let file = match config_file_path(&lookup) {
            Some(path) => {
                info!("Loading config from {:?}", path);
                FileConfig::from_path(&path)?
            }
            None => FileConfig::default(),
        };
        Self::resolve(file, lookup)
    }

    /// Combine file settings with environment values
    pub fn resolve(
        file: FileConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let database_url = required(DATABASE_URL_ENV)?;
        let api_key = required(API_KEY_ENV)?;

        let bind_addr = lookup(BIND_ADDR_ENV).unwrap_or(file.server.bind_addr);
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_addr.clone()))?;

        let mut llm = file.llm;
        if let Some(endpoint) = lookup(LLM_ENDPOINT_ENV) {
            llm.endpoint = endpoint;
        }
        if let Some(model) = lookup(LLM_MODEL_ENV) {
            llm.model = model;
        }

        Ok(Self {
            bind_addr,
            llm,
            database_url,
            api_key,
        })
    }
}

fn config_file_path(lookup: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(path) = lookup(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    let system = PathBuf::from(CONFIG_PATH);
    system.exists().then_some(system)
}
