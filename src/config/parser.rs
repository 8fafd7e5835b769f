use crate::config::types::EdgeConfig;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable that overrides `remote.api-key`
pub const API_KEY_ENV: &str = "BOTMON_API_KEY";

/// Loads and parses a configuration file from the given path
///
/// The `BOTMON_API_KEY` environment variable, when set, replaces the remote API
/// key from the file.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(EdgeConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use botmon_edge::config::load_config;
///
/// let config = load_config(Path::new("botmon.toml")).unwrap();
/// println!("Remote config: {}", config.remote.is_some());
/// ```
pub fn load_config(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;

    apply_env_api_key(&mut config, std::env::var(API_KEY_ENV).ok());

    validate(&config)?;

    Ok(config)
}

/// Parses TOML configuration text without validating it
pub fn parse_config(content: &str) -> Result<EdgeConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Replaces the remote API key when an environment value is present
fn apply_env_api_key(config: &mut EdgeConfig, env_key: Option<String>) {
    let Some(key) = env_key.filter(|k| !k.trim().is_empty()) else {
        return;
    };
    if let Some(remote) = config.remote.as_mut() {
        remote.api_key = Some(key);
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(EdgeConfig, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
