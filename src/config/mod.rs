//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. CLI flags, applied afterwards through [`apply_overrides`]
//! 2. Environment variables (`TOOLRELAY_*`, with `OPENAI_*` fallbacks)
//! 3. TOML file specified via --config CLI flag
//! 4. ./toolrelay.toml in the current directory
//! 5. $XDG_CONFIG_HOME/toolrelay/toolrelay.toml (or ~/.config/toolrelay/toolrelay.toml)
//! 6. Built-in defaults

use crate::error::ConfigError;
use crate::types::ReasoningEffort;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

mod defaults;
mod env;
mod init;
mod types;

use defaults::CONFIG_FILE_NAME;
pub use init::{config_root_dir, initialize_local_config};
use types::FileConfig;
pub use types::{ApiConfig, ChatConfig, Config, ConfigInitResult, ConfigOverrides, ServerConfig};

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from --config flag).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    load_config_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

fn load_config_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<Config, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let (config_text, source) = read_config_text(path_override, &read_file, &config_root)?;
    match &source {
        Some(path) => debug!(path = %path.display(), "loaded config file"),
        None => debug!("no config file found; using built-in defaults"),
    }
    let parsed: FileConfig = toml::from_str(&config_text)?;
    let mut config = resolve_file_config(parsed, &env_lookup)?;
    env::apply_env_overrides(&mut config, &env_lookup)?;
    validate_base_url(&config.api.base_url)?;
    Ok(config)
}

fn read_config_text<FRead, FRoot>(
    path_override: Option<&str>,
    read_file: &FRead,
    config_root: &FRoot,
) -> Result<(String, Option<PathBuf>), ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FRoot: Fn() -> Option<PathBuf>,
{
    // An explicit path must exist; the implicit locations are optional.
    if let Some(p) = path_override {
        let path = PathBuf::from(p);
        let text = read_file(&path)?;
        return Ok((text, Some(path)));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if let Ok(text) = read_file(&local) {
        return Ok((text, Some(local)));
    }
    if let Some(dir) = config_root() {
        let global = dir.join("toolrelay").join(CONFIG_FILE_NAME);
        if let Ok(text) = read_file(&global) {
            return Ok((text, Some(global)));
        }
    }

    Ok((String::new(), None))
}

fn resolve_file_config<FEnv>(parsed: FileConfig, env_lookup: &FEnv) -> Result<Config, ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    let mut config = Config::default();
    let FileConfig { api, chat, server } = parsed;

    if let Some(url) = normalized(api.base_url) {
        config.api.base_url = url;
    }
    // Inline keys win over `api_key_env`.
    if let Some(key) = normalized(api.api_key) {
        config.api.api_key = key;
    } else if let Some(var) = normalized(api.api_key_env) {
        config.api.api_key = env::env_value(env_lookup, &var).unwrap_or_default();
    }
    if let Some(model) = normalized(api.model) {
        config.api.model = model;
    }
    if let Some(timeout) = api.timeout_secs {
        config.api.timeout_secs = timeout.max(1);
    }

    if let Some(prompt) = chat.system_prompt {
        config.chat.system_prompt = prompt;
    }
    if let Some(effort) = normalized(chat.reasoning_effort) {
        config.chat.reasoning_effort = effort
            .parse::<ReasoningEffort>()
            .map_err(|e| ConfigError::Invalid(format!("chat.reasoning_effort: {e}")))?;
    }
    if let Some(prefix) = chat.reasoning_model_prefix {
        config.chat.reasoning_model_prefix = prefix.trim().to_string();
    }

    if let Some(listen) = normalized(server.listen) {
        config.server.listen = parse_listen(&listen)?;
    }
    if let Some(cors) = server.cors {
        config.server.cors = cors;
    }
    if let Some(level) = normalized(server.log_level) {
        config.server.log_level = level;
    }

    Ok(config)
}

/// Apply command-line overrides on top of a loaded config.
pub fn apply_overrides(
    config: &mut Config,
    overrides: &ConfigOverrides,
) -> Result<(), ConfigError> {
    if let Some(model) = normalized(overrides.model.clone()) {
        config.api.model = model;
    }
    if let Some(url) = normalized(overrides.base_url.clone()) {
        validate_base_url(&url)?;
        config.api.base_url = url;
    }
    if let Some(listen) = normalized(overrides.listen.clone()) {
        config.server.listen = parse_listen(&listen)?;
    }
    Ok(())
}

pub(crate) fn parse_listen(value: &str) -> Result<SocketAddr, ConfigError> {
    value.trim().parse::<SocketAddr>().map_err(|_| {
        ConfigError::Invalid(format!(
            "invalid listen address `{value}`: expected host:port such as 127.0.0.1:3000"
        ))
    })
}

fn validate_base_url(url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "api.base_url `{url}` must start with http:// or https://"
        )))
    }
}

fn normalized(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
