//! Environment overrides.
//!
//! Canonical `TOOLRELAY_*` variables take precedence; the conventional
//! `OPENAI_*` names are accepted as fallbacks for the API settings.

use crate::error::ConfigError;

use super::Config;

const API_KEY_VARS: (&str, &str) = ("TOOLRELAY_API_KEY", "OPENAI_API_KEY");
const BASE_URL_VARS: (&str, &str) = ("TOOLRELAY_BASE_URL", "OPENAI_BASE_URL");
const MODEL_VARS: (&str, &str) = ("TOOLRELAY_MODEL", "OPENAI_MODEL");
const LISTEN_VAR: &str = "TOOLRELAY_LISTEN";
const API_TIMEOUT_VAR: &str = "TOOLRELAY_API_TIMEOUT_SECS";

pub(super) fn apply_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(key) = env_with_fallback(env_lookup, API_KEY_VARS) {
        config.api.api_key = key;
    }
    if let Some(url) = env_with_fallback(env_lookup, BASE_URL_VARS) {
        config.api.base_url = url;
    }
    if let Some(model) = env_with_fallback(env_lookup, MODEL_VARS) {
        config.api.model = model;
    }
    if let Some(listen) = env_value(env_lookup, LISTEN_VAR) {
        config.server.listen = super::parse_listen(&listen)?;
    }
    if let Some(timeout) = env_value(env_lookup, API_TIMEOUT_VAR) {
        // Clamp to at least 1 second so a zero never disables the timeout.
        let parsed = timeout.parse::<u64>().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid {API_TIMEOUT_VAR} value `{timeout}`: expected positive integer seconds"
            ))
        })?;
        config.api.timeout_secs = parsed.max(1);
    }
    Ok(())
}

/// Resolve a value from the canonical env var or, if absent, its fallback.
fn env_with_fallback<FEnv>(
    env_lookup: &FEnv,
    (canonical, fallback): (&str, &str),
) -> Option<String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    env_value(env_lookup, canonical).or_else(|| env_value(env_lookup, fallback))
}

/// Trimmed, non-empty env value.
pub(super) fn env_value<FEnv>(env_lookup: &FEnv, name: &str) -> Option<String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    env_lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
