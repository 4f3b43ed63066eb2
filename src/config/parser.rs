use crate::config::types::Config;
use crate::config::validation::validate;
use crate::{ConfigError, ConfigResult};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads the configuration from an optional TOML file and the environment
///
/// Without a file every setting starts from its default. Environment
/// variables are applied on top of the file (see [`apply_env_overrides`])
/// and the merged result is validated.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file, if any
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: Option<&Path>) -> ConfigResult<Config> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    validate(&config)?;

    Ok(config)
}

/// Applies environment-style overrides to a configuration
///
/// | Variable | Setting |
/// |----------|---------|
/// | `USE_PROXY` | `proxy.enabled` (`"true"`, any case, enables) |
/// | `PROXY_HTTP` | `proxy.http` |
/// | `PROXY_HTTPS` | `proxy.https` |
/// | `PROXY_HEALTH_URL` | `proxy.health-url` |
/// | `REDIS_URL` | `queue.redis-url` |
/// | `INBOUND_QUEUE` | `queue.inbound` |
///
/// Unset or empty variables leave the current value in place.
///
/// # Arguments
///
/// * `config` - The configuration to update
/// * `lookup` - Resolves a variable name to its value
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(value) = var("USE_PROXY") {
        config.proxy.enabled = value.trim().eq_ignore_ascii_case("true");
    }
    if let Some(value) = var("PROXY_HTTP") {
        config.proxy.http = Some(value);
    }
    if let Some(value) = var("PROXY_HTTPS") {
        config.proxy.https = Some(value);
    }
    if let Some(value) = var("PROXY_HEALTH_URL") {
        config.proxy.health_url = value;
    }
    if let Some(value) = var("REDIS_URL") {
        config.queue.redis_url = value;
    }
    if let Some(value) = var("INBOUND_QUEUE") {
        config.queue.inbound = value;
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a running worker can be matched to the file it was
/// started with.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and the file hash
///
/// The hash is `None` when no file was given.
pub fn load_config_with_hash(path: Option<&Path>) -> ConfigResult<(Config, Option<String>)> {
    let config = load_config(path)?;
    let hash = path.map(compute_config_hash).transpose()?;
    Ok((config, hash))
}
