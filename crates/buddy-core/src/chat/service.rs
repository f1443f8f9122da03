//! Chat service running one streaming turn end to end.
//!
//! ChatService opens the transport, decodes the event stream while handing
//! deltas to the caller, runs the Response Extractor over the assembled text
//! and persists any extracted records.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use buddy_types::chat::ChatRequest;
use buddy_types::error::{ChatError, StoreError};
use buddy_types::record::{RecordPayload, StoredRecord};

use crate::chat::store::RecordStore;
use crate::chat::transport::ChatTransport;
use crate::extract::parse_response;
use crate::stream::{DecodeSummary, decode_stream};

/// Outcome of one assistant turn.
#[derive(Debug)]
pub struct ChatTurn {
    /// Concatenation of every delta, directives included.
    pub raw_text: String,
    pub display_text: String,
    pub chips: Vec<String>,
    pub entry: Option<RecordPayload>,
    pub intake: Option<RecordPayload>,
    pub summary: DecodeSummary,
    /// Records the store accepted, in extraction order.
    pub saved: Vec<StoredRecord>,
    /// Records the store rejected. The turn itself still succeeded.
    pub store_errors: Vec<StoreError>,
}

impl ChatTurn {
    pub fn cancelled(&self) -> bool {
        self.summary.cancelled
    }
}

/// Runs chat turns against a transport, persisting records to a store.
///
/// Generic over `ChatTransport` and `RecordStore` so buddy-core never
/// depends on buddy-infra.
pub struct ChatService<T: ChatTransport, R: RecordStore> {
    transport: T,
    store: R,
}

impl<T: ChatTransport, R: RecordStore> ChatService<T, R> {
    pub fn new(transport: T, store: R) -> Self {
        Self { transport, store }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    /// Send `request` and stream the reply.
    ///
    /// `on_delta` receives each text delta in arrival order, before any
    /// extraction. Fails only if the transport cannot open the stream. A
    /// cancelled turn still returns whatever text arrived, but nothing from
    /// it is persisted.
    pub async fn send_turn<F>(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
        mut on_delta: F,
    ) -> Result<ChatTurn, ChatError>
    where
        F: FnMut(&str),
    {
        if request.messages.is_empty() {
            return Err(ChatError::InvalidRequest(
                "a turn needs at least one message".to_string(),
            ));
        }

        let body = self.transport.open(request).await?;

        let mut raw_text = String::new();
        let summary = decode_stream(body, cancel, |delta| {
            raw_text.push_str(delta);
            on_delta(delta);
        })
        .await;

        let parsed = parse_response(&raw_text);
        let mut saved = Vec::new();
        let mut store_errors = Vec::new();

        if summary.cancelled {
            debug!(chars = raw_text.len(), "turn cancelled, skipping record persistence");
        } else {
            for (kind, payload) in parsed.records() {
                let record = StoredRecord::new(kind, payload.clone());
                match self.store.save(&record).await {
                    Ok(()) => {
                        debug!(record_id = %record.id, kind = %kind, "record saved");
                        saved.push(record);
                    }
                    Err(e) => {
                        warn!(kind = %kind, error = %e, "failed to save extracted record");
                        store_errors.push(e);
                    }
                }
            }
        }

        info!(
            deltas = summary.deltas,
            saw_done = summary.saw_done,
            cancelled = summary.cancelled,
            chips = parsed.chips.len(),
            entry = parsed.entry.is_some(),
            intake = parsed.intake.is_some(),
            "chat turn complete"
        );

        Ok(ChatTurn {
            raw_text,
            display_text: parsed.display_text,
            chips: parsed.chips,
            entry: parsed.entry,
            intake: parsed.intake,
            summary,
            saved,
            store_errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use buddy_types::chat::ChatMessage;
    use buddy_types::record::RecordKind;
    use bytes::Bytes;
    use futures_util::stream;

    use super::*;
    use crate::chat::transport::ByteStream;

    /// Replays a fixed body, or fails to open.
    struct ScriptedTransport {
        body: Result<Vec<&'static str>, u16>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedTransport {
        fn replying(chunks: Vec<&'static str>) -> Self {
            Self {
                body: Ok(chunks),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                body: Err(status),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChatTransport for ScriptedTransport {
        async fn open(&self, request: &ChatRequest) -> Result<ByteStream, ChatError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.body {
                Ok(chunks) => {
                    let items: Vec<Result<Bytes, std::io::Error>> = chunks
                        .iter()
                        .copied()
                        .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                        .collect();
                    Ok(Box::pin(stream::iter(items)))
                }
                Err(429) => Err(ChatError::RateLimited {
                    message: "Rate limit exceeded".to_string(),
                }),
                Err(status) => Err(ChatError::Status {
                    status: *status,
                    message: "boom".to_string(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<Vec<StoredRecord>>,
        fail: bool,
    }

    impl RecordStore for MemoryStore {
        async fn save(&self, record: &StoredRecord) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Io("disk full".to_string()));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    const REPLY: [&str; 4] = [
        "data: {\"choices\":[{\"delta\":{\"content\":\"I hear \"}}]}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"you. [ENTRY_SAVE]\\n{\\\"pain_level\\\":7}\\n[/ENTRY_SAVE]\"}}]}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"\\nCHIPS:Ok|Tell me more\"}}]}\n",
        "data: [DONE]\n",
    ];

    fn request() -> ChatRequest {
        ChatRequest::new(vec![ChatMessage::user("My back hurts")])
    }

    #[tokio::test]
    async fn test_turn_extracts_and_persists() {
        let service = ChatService::new(
            ScriptedTransport::replying(REPLY.to_vec()),
            MemoryStore::default(),
        );
        let cancel = CancellationToken::new();
        let mut streamed = String::new();

        let turn = service
            .send_turn(&request(), &cancel, |d| streamed.push_str(d))
            .await
            .unwrap();

        assert_eq!(streamed, turn.raw_text);
        assert_eq!(turn.display_text, "I hear you.");
        assert_eq!(turn.chips, vec!["Ok", "Tell me more"]);
        assert_eq!(turn.entry.as_ref().unwrap()["pain_level"], 7);
        assert!(turn.summary.saw_done);
        assert!(turn.store_errors.is_empty());

        let records = service.store().records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, RecordKind::EntrySave);
        assert_eq!(records[0].id, turn.saved[0].id);
    }

    #[tokio::test]
    async fn test_request_reaches_transport() {
        let service = ChatService::new(
            ScriptedTransport::replying(vec!["data: [DONE]\n"]),
            MemoryStore::default(),
        );
        let cancel = CancellationToken::new();
        service.send_turn(&request(), &cancel, |_| {}).await.unwrap();

        let requests = service.transport().requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].content, "My back hurts");
    }

    #[tokio::test]
    async fn test_open_failure_is_the_turn_error() {
        let service = ChatService::new(ScriptedTransport::failing(429), MemoryStore::default());
        let cancel = CancellationToken::new();
        let mut called = false;

        let err = service
            .send_turn(&request(), &cancel, |_| called = true)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::RateLimited { .. }));
        assert_eq!(err.user_message(), "Rate limit exceeded");
        assert!(!called);
    }

    #[tokio::test]
    async fn test_empty_history_is_rejected() {
        let service = ChatService::new(
            ScriptedTransport::replying(REPLY.to_vec()),
            MemoryStore::default(),
        );
        let cancel = CancellationToken::new();
        let err = service
            .send_turn(&ChatRequest::new(Vec::new()), &cancel, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidRequest(_)));
        assert!(service.transport().requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_does_not_fail_turn() {
        let store = MemoryStore {
            fail: true,
            ..Default::default()
        };
        let service = ChatService::new(ScriptedTransport::replying(REPLY.to_vec()), store);
        let cancel = CancellationToken::new();

        let turn = service.send_turn(&request(), &cancel, |_| {}).await.unwrap();

        assert_eq!(turn.display_text, "I hear you.");
        assert_eq!(turn.store_errors.len(), 1);
        assert!(turn.saved.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_turn_persists_nothing() {
        let service = ChatService::new(
            ScriptedTransport::replying(REPLY.to_vec()),
            MemoryStore::default(),
        );
        let cancel = CancellationToken::new();

        let turn = service
            .send_turn(&request(), &cancel, |d| {
                if d.contains("[ENTRY_SAVE]") {
                    cancel.cancel();
                }
            })
            .await
            .unwrap();

        assert!(turn.cancelled());
        assert!(turn.chips.is_empty());
        assert!(service.store().records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reply_without_directives() {
        let service = ChatService::new(
            ScriptedTransport::replying(vec![
                ": keep-alive\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hello!\"}}]}\n\n",
            ]),
            MemoryStore::default(),
        );
        let cancel = CancellationToken::new();
        let turn = service.send_turn(&request(), &cancel, |_| {}).await.unwrap();

        assert_eq!(turn.display_text, "Hello!");
        assert!(turn.chips.is_empty());
        assert!(turn.saved.is_empty());
        assert!(!turn.summary.saw_done);
    }
}
