//! Configuration data model.
//!
//! This module holds struct definitions plus default values. Loader and
//! source-resolution logic stays in `config::mod` so precedence behavior is
//! centralized.

use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use super::defaults::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_LOG_LEVEL, DEFAULT_MODEL_ID,
    DEFAULT_REASONING_MODEL_PREFIX, DEFAULT_SYSTEM_PROMPT,
};
use crate::types::ReasoningEffort;

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api: ApiConfig,
    pub chat: ChatConfig,
    pub server: ServerConfig,
}

/// Resolved API connection settings used by the HTTP client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token. Empty means no `Authorization` header is sent.
    pub api_key: String,
    /// Model used when a request does not name one.
    pub model: String,
    /// Timeout for buffered model API requests.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.into(),
            api_key: String::new(),
            model: DEFAULT_MODEL_ID.into(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

/// Conversation defaults applied when a request omits them.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub system_prompt: String,
    pub reasoning_effort: ReasoningEffort,
    pub reasoning_model_prefix: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            reasoning_effort: ReasoningEffort::default(),
            reasoning_model_prefix: DEFAULT_REASONING_MODEL_PREFIX.into(),
        }
    }
}

/// Inbound HTTP surface settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub cors: bool,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
            cors: true,
            log_level: DEFAULT_LOG_LEVEL.into(),
        }
    }
}

/// Values supplied on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub listen: Option<String>,
}

// ---------------------------------------------------------------------------
// On-disk shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct FileConfig {
    pub(super) api: FileApiConfig,
    pub(super) chat: FileChatConfig,
    pub(super) server: FileServerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct FileApiConfig {
    pub(super) base_url: Option<String>,
    pub(super) api_key: Option<String>,
    /// Name of an env var holding the key.
    pub(super) api_key_env: Option<String>,
    pub(super) model: Option<String>,
    pub(super) timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct FileChatConfig {
    pub(super) system_prompt: Option<String>,
    pub(super) reasoning_effort: Option<String>,
    pub(super) reasoning_model_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct FileServerConfig {
    pub(super) listen: Option<String>,
    pub(super) cors: Option<bool>,
    pub(super) log_level: Option<String>,
}

/// Result of `toolrelay init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigInitResult {
    Created { path: PathBuf },
    AlreadyInitialized { path: PathBuf },
}
