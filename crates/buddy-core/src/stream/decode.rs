//! Async drivers that pump a transport byte stream through a [`FrameDecoder`].
//!
//! Two shapes of the same loop:
//! - [`decode_stream`] pushes each delta into a caller-supplied callback and
//!   returns once the stream is complete (the single completion signal).
//! - [`delta_stream`] exposes the deltas as an async `Stream<Item = String>`.
//!
//! Both suspend only while awaiting the next chunk. A slow consumer therefore
//! delays the next read; nothing is queued beyond the decoder's line buffer.

use std::fmt::Display;

use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::frame::FrameDecoder;

/// Result of decoding one stream to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    /// Number of deltas delivered to the consumer.
    pub deltas: usize,
    /// Raw bytes read from the transport.
    pub bytes: usize,
    /// The `[DONE]` frame was seen.
    pub saw_done: bool,
    /// The caller cancelled before the stream finished.
    pub cancelled: bool,
    /// The body failed mid-stream; decoding stopped there.
    pub interrupted: Option<String>,
}

/// Drive `stream` to completion, invoking `on_delta` for every text delta in
/// arrival order.
///
/// Never fails: a body read error after decoding began ends the stream (the
/// deltas already delivered stand) and is reported on the summary. After
/// `cancel` fires no further `on_delta` call is made and no final flush runs.
/// Stopping early drops `stream`, which lets the transport abort its request.
pub async fn decode_stream<S, B, E, F>(
    stream: S,
    cancel: &CancellationToken,
    mut on_delta: F,
) -> DecodeSummary
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    F: FnMut(&str),
{
    let mut stream = std::pin::pin!(stream);
    let mut decoder = FrameDecoder::new();
    let mut summary = DecodeSummary::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(deltas = summary.deltas, "chat stream cancelled");
                summary.cancelled = true;
                return summary;
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                let chunk = chunk.as_ref();
                summary.bytes += chunk.len();
                let deltas = decoder.feed(chunk);
                if !deliver(deltas, cancel, &mut on_delta, &mut summary) {
                    return summary;
                }
                if decoder.is_done() {
                    break;
                }
            }
            Some(Err(e)) => {
                warn!(error = %e, "chat stream body read failed, treating as end of stream");
                summary.interrupted = Some(e.to_string());
                break;
            }
            None => break,
        }
    }

    let unterminated = decoder.buffered().len();
    let tail = decoder.finish();
    if !deliver(tail, cancel, &mut on_delta, &mut summary) {
        return summary;
    }
    summary.saw_done = decoder.is_done();

    debug!(
        deltas = summary.deltas,
        bytes = summary.bytes,
        saw_done = summary.saw_done,
        unterminated,
        "chat stream decoded"
    );
    summary
}

/// Hand deltas to the consumer. Returns false if cancellation cut delivery short.
fn deliver<F: FnMut(&str)>(
    deltas: Vec<String>,
    cancel: &CancellationToken,
    on_delta: &mut F,
    summary: &mut DecodeSummary,
) -> bool {
    for delta in deltas {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            return false;
        }
        on_delta(&delta);
        summary.deltas += 1;
    }
    true
}

/// Decode `stream` into an async sequence of text deltas.
///
/// Same framing and recovery rules as [`decode_stream`]; the sequence simply
/// ends on `[DONE]`, end of body, a body read error, or cancellation.
pub fn delta_stream<S, B, E>(stream: S, cancel: CancellationToken) -> impl Stream<Item = String>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    async_stream::stream! {
        let mut stream = std::pin::pin!(stream);
        let mut decoder = FrameDecoder::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = stream.next() => Some(next),
            };

            let deltas = match next {
                // Cancelled.
                None => return,
                Some(Some(Ok(chunk))) => decoder.feed(chunk.as_ref()),
                Some(Some(Err(e))) => {
                    warn!(error = %e, "chat stream body read failed, treating as end of stream");
                    break;
                }
                Some(None) => break,
            };

            for delta in deltas {
                if cancel.is_cancelled() {
                    return;
                }
                yield delta;
            }
            if decoder.is_done() {
                return;
            }
        }

        for delta in decoder.finish() {
            if cancel.is_cancelled() {
                return;
            }
            yield delta;
        }
    }
}
