use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and validates a configuration file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads the configuration file when it exists, otherwise falls back to
/// the built-in defaults. The run command must work with no flags at all.
///
/// Returns the config and the SHA-256 hash of the file it came from
/// (`"default"` when no file was read), so operators can see in the logs
/// when the config changed between runs.
pub fn load_config_or_default(path: &Path) -> Result<(Config, String), ConfigError> {
    if path.exists() {
        let config = load_config(path)?;
        let hash = compute_config_hash(path)?;
        Ok((config, hash))
    } else {
        let config = Config::default();
        validate(&config)?;
        Ok((config, "default".to_string()))
    }
}

/// SHA-256 of the configuration file content, hex-encoded.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
