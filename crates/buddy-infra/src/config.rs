//! Configuration loading for Buddy.
//!
//! Reads `config.toml` from the data directory (`~/.buddy/` by default) into
//! [`BuddyConfig`] and resolves the endpoint API key from the environment.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use buddy_types::config::BuddyConfig;
use buddy_types::error::ConfigError;

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `BUDDY_DATA_DIR` environment variable
/// 2. `~/.buddy`
/// 3. `./.buddy`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BUDDY_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".buddy");
    }

    PathBuf::from(".buddy")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`BuddyConfig::default()`].
/// - If the file exists but cannot be read or parsed, returns an error.
pub async fn load_config(data_dir: &Path) -> Result<BuddyConfig, ConfigError> {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return Ok(BuddyConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: config_path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    toml::from_str::<BuddyConfig>(&content).map_err(|err| ConfigError::Parse {
        path: config_path.display().to_string(),
        message: err.to_string(),
    })
}

/// Read the API key from the environment variable named in `config`.
pub fn read_api_key(config: &BuddyConfig) -> Result<SecretString, ConfigError> {
    api_key_from(&config.api_key_env, std::env::var(&config.api_key_env).ok())
}

fn api_key_from(var: &str, value: Option<String>) -> Result<SecretString, ConfigError> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(SecretString::from(key.trim().to_string())),
        _ => Err(ConfigError::MissingApiKey(var.to_string())),
    }
}

/// Path of the JSON-lines record log for `config`.
pub fn record_log_path(data_dir: &Path, config: &BuddyConfig) -> PathBuf {
    data_dir.join(&config.record_log)
}
