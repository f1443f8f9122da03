//! HttpChatTransport -- concrete [`ChatTransport`] for the Buddy chat endpoint.
//!
//! POSTs the request as JSON with Bearer token authentication and hands back
//! the raw event-stream body. Framing is left entirely to `buddy-core`.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};

use buddy_core::chat::transport::{ByteStream, ChatTransport};
use buddy_types::chat::ChatRequest;
use buddy_types::error::{ChatError, FALLBACK_ERROR_MESSAGE};

/// Streaming chat transport over HTTP.
pub struct HttpChatTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

impl HttpChatTransport {
    /// Build a transport for `endpoint`.
    ///
    /// Only connection establishment is bounded by `connect_timeout`; a
    /// response that streams slowly is never cut off here.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: SecretString,
        connect_timeout: Duration,
    ) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ChatError::Connect(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

impl ChatTransport for HttpChatTransport {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, ChatError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            messages = request.messages.len(),
            mode = ?request.mode,
            "opening chat stream"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(endpoint = %self.endpoint, error = %e, "chat request failed");
                ChatError::Connect(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %error_body, "chat endpoint error response");
            return Err(status_error(status.as_u16(), &error_body));
        }

        let body = response.bytes_stream().map(|chunk| chunk.map_err(std::io::Error::other));
        Ok(Box::pin(body))
    }
}

/// Map a non-2xx response to a [`ChatError`].
///
/// The message is the body's JSON `error` string when present, otherwise
/// [`FALLBACK_ERROR_MESSAGE`].
pub fn status_error(status: u16, body: &str) -> ChatError {
    let message = error_message(body);
    match status {
        429 => ChatError::RateLimited { message },
        402 => ChatError::CreditsDepleted { message },
        status => ChatError::Status { status, message },
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.as_str().map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
}
