//! ChatTransport trait definition.

use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use buddy_types::chat::ChatRequest;
use buddy_types::error::ChatError;

/// Raw response body, chunked however the network delivers it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Opens a streaming chat request against the Buddy backend.
///
/// Implementations live in buddy-infra (e.g., `HttpChatTransport`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatTransport: Send + Sync {
    /// Send `request` and return the response body once the status is known
    /// to be successful.
    ///
    /// This is the only failure point of a turn. Errors after the body starts
    /// surface as `Err` items on the stream and end decoding quietly.
    fn open(
        &self,
        request: &ChatRequest,
    ) -> impl std::future::Future<Output = Result<ByteStream, ChatError>> + Send;
}
