//! Default configuration constants.
//!
//! Callers share these constants instead of duplicating literals.

/// Embedded default `toolrelay.toml` template written by `toolrelay init`.
pub(super) const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../templates/toolrelay.toml");
/// File name looked up in the working directory and the per-user config dir.
pub(super) const CONFIG_FILE_NAME: &str = "toolrelay.toml";
/// Default OpenAI-compatible API base URL.
pub(super) const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
/// Model used when neither the request nor the config names one.
pub(super) const DEFAULT_MODEL_ID: &str = "gpt-4.1-mini";
/// Timeout for buffered model API requests.
pub(super) const DEFAULT_API_TIMEOUT_SECS: u64 = 120;
pub(super) const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful API tutor.";
/// Model-name prefix that selects the reasoning tier.
pub(super) const DEFAULT_REASONING_MODEL_PREFIX: &str = "gpt-5";
pub(super) const DEFAULT_LOG_LEVEL: &str = "info";
