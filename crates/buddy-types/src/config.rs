//! Global configuration types for Buddy.
//!
//! `BuddyConfig` represents the `config.toml` in the data directory that
//! points the client at a chat endpoint and carries per-user preferences.

use serde::{Deserialize, Serialize};

use crate::chat::ChatMode;

/// Top-level client configuration.
///
/// Loaded from `~/.buddy/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuddyConfig {
    /// Chat endpoint that answers with an event stream.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Name of the environment variable holding the endpoint API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// TCP connect timeout. The stream itself is never timed out here.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Conversation flow used when the CLI is not told otherwise.
    #[serde(default)]
    pub default_mode: ChatMode,

    /// Free-form preferences forwarded with every request.
    #[serde(default)]
    pub preferences: serde_json::Map<String, serde_json::Value>,

    /// File name (inside the data dir) of the JSON-lines record log.
    #[serde(default = "default_record_log")]
    pub record_log: String,
}

fn default_endpoint() -> String {
    "http://localhost:54321/functions/v1/buddyChat".to_string()
}

fn default_api_key_env() -> String {
    "BUDDY_API_KEY".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_record_log() -> String {
    "records.jsonl".to_string()
}

impl Default for BuddyConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            connect_timeout_secs: default_connect_timeout_secs(),
            default_mode: ChatMode::default(),
            preferences: serde_json::Map::new(),
            record_log: default_record_log(),
        }
    }
}
