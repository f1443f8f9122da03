use thiserror::Error;

/// Message shown when the endpoint does not supply one of its own.
pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to connect to Buddy";

/// Errors from opening a chat stream.
///
/// Only raised before decoding begins. Once deltas are flowing, framing
/// problems degrade to "nothing extracted" instead of failing the turn.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{message}")]
    RateLimited { message: String },

    #[error("{message}")]
    CreditsDepleted { message: String },

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("Failed to connect to Buddy: {0}")]
    Connect(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ChatError {
    /// Single human-readable line for a user-facing notification.
    pub fn user_message(&self) -> &str {
        match self {
            ChatError::RateLimited { message }
            | ChatError::CreditsDepleted { message }
            | ChatError::Status { message, .. } => message,
            ChatError::Connect(_) | ChatError::InvalidRequest(_) => FALLBACK_ERROR_MESSAGE,
        }
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::RateLimited { .. } => Some(429),
            ChatError::CreditsDepleted { .. } => Some(402),
            ChatError::Status { status, .. } => Some(*status),
            ChatError::Connect(_) | ChatError::InvalidRequest(_) => None,
        }
    }
}

/// Errors from persisting an extracted record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store I/O error: {0}")]
    Io(String),

    #[error("record serialization error: {0}")]
    Serialization(String),
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("invalid config file '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("missing API key: set the {0} environment variable")]
    MissingApiKey(String),
}
