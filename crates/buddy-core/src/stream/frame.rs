//! Line-oriented event-stream frame decoder.
//!
//! The chat endpoint relays an OpenAI-style chat completion stream:
//!
//! ```text
//! : keep-alive
//! data: {"choices":[{"delta":{"content":"I hear "}}]}
//! data: {"choices":[{"delta":{"content":"you."}}]}
//! data: [DONE]
//! ```
//!
//! Each newline-terminated line is one frame. Comment and blank lines are
//! keep-alives, `data: ` lines carry a JSON payload, anything else is ignored
//! so new frame types do not break old clients. Chunk boundaries from the
//! transport are arbitrary and may split a line or a multi-byte character.

use serde_json::Value;
use tracing::debug;

/// Prefix of a data frame (including the single space).
pub const DATA_PREFIX: &str = "data: ";

/// Payload of the data frame that terminates a stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Classification of one line of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Starts with `:`.
    Comment,
    /// Empty or whitespace only.
    Blank,
    /// `data: ` line; holds the trimmed payload after the prefix.
    Data(&'a str),
    /// Any other non-empty line.
    Unrecognized,
}

/// Classify a line that has already had its line terminator removed.
pub fn classify_line(line: &str) -> Frame<'_> {
    if line.starts_with(':') {
        return Frame::Comment;
    }
    if line.trim().is_empty() {
        return Frame::Blank;
    }
    match line.strip_prefix(DATA_PREFIX) {
        Some(payload) => Frame::Data(payload.trim()),
        None => Frame::Unrecognized,
    }
}

/// Text delta at `choices[0].delta.content`.
///
/// A missing path, a non-string value, or an empty string all mean "no
/// delta" (role-only and usage frames carry no text).
pub fn delta_text(payload: &Value) -> Option<&str> {
    payload
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .filter(|text| !text.is_empty())
}

/// What a single line contributes to the decoded output.
#[derive(Debug, PartialEq, Eq)]
enum LineOutcome {
    Skip,
    Delta(String),
    Done,
    Malformed,
}

fn interpret_line(line: &str) -> LineOutcome {
    match classify_line(line) {
        Frame::Comment | Frame::Blank | Frame::Unrecognized => LineOutcome::Skip,
        Frame::Data(payload) if payload == DONE_SENTINEL => LineOutcome::Done,
        Frame::Data(payload) => match serde_json::from_str::<Value>(payload) {
            Ok(value) => match delta_text(&value) {
                Some(text) => LineOutcome::Delta(text.to_owned()),
                None => LineOutcome::Skip,
            },
            Err(_) => LineOutcome::Malformed,
        },
    }
}

/// UTF-8 byte order mark, dropped once at the very start of a stream.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// UTF-8 decoding that carries an incomplete trailing sequence over to the
/// next chunk. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
struct Utf8Carry {
    pending: Vec<u8>,
    /// The start of the stream has been checked for a byte order mark.
    bom_checked: bool,
}

impl Utf8Carry {
    fn decode_into(&mut self, chunk: &[u8], out: &mut String) {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut rest = bytes.as_slice();
        if !self.bom_checked {
            if rest.len() < UTF8_BOM.len() && UTF8_BOM.starts_with(rest) {
                // Could still be a split BOM; wait for more bytes.
                self.pending = bytes;
                return;
            }
            self.bom_checked = true;
            rest = rest.strip_prefix(UTF8_BOM).unwrap_or(rest);
        }

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    return;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(invalid_len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[invalid_len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }

    fn finish_into(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            self.pending.clear();
            out.push(char::REPLACEMENT_CHARACTER);
        }
    }
}

/// Incremental decoder for one stream.
///
/// Owns all buffering state, so every stream gets its own decoder and
/// concurrent streams never interfere. Feed chunks in arrival order with
/// [`feed`](Self::feed), then call [`finish`](Self::finish) once the
/// transport reports end of stream.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    utf8: Utf8Carry,
    buffer: String,
    done: bool,
    flushed: bool,
    /// The first buffered line failed to parse on the previous pass.
    stalled: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` frame has been processed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Text received but not yet consumed as a complete line.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Decode one transport chunk and return the deltas it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut deltas = Vec::new();
        if self.done || self.flushed {
            return deltas;
        }

        self.utf8.decode_into(chunk, &mut self.buffer);

        while let Some(newline) = self.buffer.find('\n') {
            let raw: String = self.buffer.drain(..=newline).collect();
            let line = &raw[..raw.len() - 1];
            let line = line.strip_suffix('\r').unwrap_or(line);

            match interpret_line(line) {
                LineOutcome::Skip => {}
                LineOutcome::Delta(text) => deltas.push(text),
                LineOutcome::Done => {
                    self.done = true;
                    self.buffer.clear();
                    break;
                }
                LineOutcome::Malformed if self.stalled => {
                    // Already newline-terminated, so more data cannot repair it.
                    debug!(len = line.len(), "dropping malformed data frame");
                }
                LineOutcome::Malformed => {
                    self.buffer.insert_str(0, &format!("{line}\n"));
                    self.stalled = true;
                    return deltas;
                }
            }
            self.stalled = false;
        }

        deltas
    }

    /// Flush whatever is still buffered after the transport ended.
    ///
    /// The last line may lack a trailing newline. Malformed lines are skipped
    /// since nothing more will arrive to complete them. Later calls return
    /// nothing.
    pub fn finish(&mut self) -> Vec<String> {
        let mut deltas = Vec::new();
        if self.done || self.flushed {
            return deltas;
        }
        self.flushed = true;
        self.stalled = false;

        self.utf8.finish_into(&mut self.buffer);
        let remaining = std::mem::take(&mut self.buffer);

        for raw in remaining.split('\n') {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            match interpret_line(line) {
                LineOutcome::Skip => {}
                LineOutcome::Delta(text) => deltas.push(text),
                LineOutcome::Done => {
                    self.done = true;
                    break;
                }
                LineOutcome::Malformed => {
                    debug!(len = line.len(), "skipping incomplete frame at end of stream");
                }
            }
        }

        deltas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_frame(content: &str) -> String {
        let payload = serde_json::json!({ "choices": [{ "delta": { "content": content } }] });
        format!("data: {payload}\n")
    }

    fn decode_chunks(chunks: &[&[u8]]) -> Vec<String> {
        let mut decoder = FrameDecoder::new();
        let mut deltas = Vec::new();
        for chunk in chunks {
            deltas.extend(decoder.feed(chunk));
        }
        deltas.extend(decoder.finish());
        deltas
    }

    fn sample_stream() -> String {
        let mut stream = String::from(": keep-alive\n\n");
        stream.push_str("data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n");
        stream.push_str(&data_frame("Ça va? "));
        stream.push_str("event: ping\n");
        stream.push_str(&data_frame("Sending 💛 "));
        stream.push_str("data: {\"choices\":[{\"delta\":{\"content\":\"and more\"}}]}\r\n");
        stream.push_str("data: [DONE]\n");
        stream
    }

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line(": ping"), Frame::Comment);
        assert_eq!(classify_line(""), Frame::Blank);
        assert_eq!(classify_line("   "), Frame::Blank);
        assert_eq!(classify_line("data:  [DONE] "), Frame::Data("[DONE]"));
        assert_eq!(classify_line("data:{}"), Frame::Unrecognized);
        assert_eq!(classify_line("event: message"), Frame::Unrecognized);
    }

    #[test]
    fn test_delta_text_path() {
        let value = serde_json::json!({"choices":[{"delta":{"content":"hi"}}]});
        assert_eq!(delta_text(&value), Some("hi"));

        let role_only = serde_json::json!({"choices":[{"delta":{"role":"assistant"}}]});
        assert_eq!(delta_text(&role_only), None);

        let empty = serde_json::json!({"choices":[{"delta":{"content":""}}]});
        assert_eq!(delta_text(&empty), None);

        let wrong_type = serde_json::json!({"choices":[{"delta":{"content":42}}]});
        assert_eq!(delta_text(&wrong_type), None);

        assert_eq!(delta_text(&serde_json::json!({"choices":[]})), None);
        assert_eq!(delta_text(&serde_json::json!([1, 2])), None);
    }

    #[test]
    fn test_single_chunk_stream() {
        let stream = sample_stream();
        let deltas = decode_chunks(&[stream.as_bytes()]);
        assert_eq!(deltas, vec!["Ça va? ", "Sending 💛 ", "and more"]);
    }

    #[test]
    fn test_every_two_way_split_matches_single_chunk() {
        let stream = sample_stream();
        let bytes = stream.as_bytes();
        let expected = decode_chunks(&[bytes]).concat();

        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(decode_chunks(&[a, b]).concat(), expected, "split at byte {split}");
        }
    }

    #[test]
    fn test_byte_at_a_time_matches_single_chunk() {
        let stream = sample_stream();
        let bytes = stream.as_bytes();
        let chunks: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(decode_chunks(&chunks), decode_chunks(&[bytes]));
    }

    #[test]
    fn test_split_inside_multibyte_character() {
        let frame = data_frame("💛");
        let bytes = frame.as_bytes();
        let heart = frame.find('💛').unwrap();

        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(&bytes[..heart + 2]).is_empty());
        assert_eq!(decoder.feed(&bytes[heart + 2..]), vec!["💛"]);
    }

    #[test]
    fn test_split_payload_emits_exactly_once() {
        let frame = data_frame("pain is a 7 today");
        let bytes = frame.as_bytes();
        let mid = frame.find("is a").unwrap();

        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(&bytes[..mid]).is_empty());
        assert!(decoder.buffered().starts_with("data: {"));
        assert_eq!(decoder.feed(&bytes[mid..]), vec!["pain is a 7 today"]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_split_at_data_prefix() {
        let frame = data_frame("hello");
        let deltas = decode_chunks(&[b"da", b"ta", &frame.as_bytes()[4..]]);
        assert_eq!(deltas, vec!["hello"]);
    }

    #[test]
    fn test_done_stops_emission() {
        let mut stream = data_frame("before");
        stream.push_str("data: [DONE]\n");
        stream.push_str(&data_frame("after"));

        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.feed(stream.as_bytes()), vec!["before"]);
        assert!(decoder.is_done());
        assert!(decoder.feed(data_frame("late").as_bytes()).is_empty());
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_done_in_final_flush_stops_emission() {
        // The malformed line stalls the chunk, so DONE is only reached on flush.
        let mut stream = data_frame("before");
        stream.push_str("data: {bad\n");
        stream.push_str("data: [DONE]\n");
        stream.push_str(&data_frame("after"));

        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.feed(stream.as_bytes()), vec!["before"]);
        assert!(!decoder.is_done());
        assert!(decoder.finish().is_empty());
        assert!(decoder.is_done());
    }

    #[test]
    fn test_final_flush_without_trailing_newline() {
        let frame = data_frame("tail");
        let deltas = decode_chunks(&[frame.trim_end().as_bytes()]);
        assert_eq!(deltas, vec!["tail"]);
    }

    #[test]
    fn test_incomplete_frame_at_end_is_dropped() {
        let mut stream = data_frame("kept");
        stream.push_str("data: {\"choices\":[{\"delta\":{\"cont");
        assert_eq!(decode_chunks(&[stream.as_bytes()]), vec!["kept"]);
    }

    #[test]
    fn test_malformed_line_is_pushed_back_then_dropped() {
        let bad = "data: {not json}\n";
        let good = data_frame("after");

        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(bad.as_bytes()).is_empty());
        assert_eq!(decoder.buffered(), "data: {not json}\n");
        assert_eq!(decoder.feed(good.as_bytes()), vec!["after"]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_malformed_line_chunking_invariance() {
        let mut stream = data_frame("one ");
        stream.push_str("data: {oops\n");
        stream.push_str(&data_frame("two"));
        let bytes = stream.as_bytes();
        let expected = decode_chunks(&[bytes]);
        assert_eq!(expected, vec!["one ", "two"]);

        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(decode_chunks(&[a, b]), expected, "split at byte {split}");
        }
    }

    #[test]
    fn test_invalid_utf8_becomes_replacement() {
        let mut bytes = b"data: {\"choices\":[{\"delta\":{\"content\":\"a".to_vec();
        bytes.push(0xFF);
        bytes.extend_from_slice(b"b\"}}]}\n");
        assert_eq!(decode_chunks(&[&bytes]), vec!["a\u{FFFD}b"]);
    }

    #[test]
    fn test_truncated_utf8_at_end_is_replaced() {
        let mut decoder = FrameDecoder::new();
        let frame = "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}";
        assert!(decoder.feed(frame.as_bytes()).is_empty());
        // First byte of a two-byte sequence, never completed.
        assert!(decoder.feed(&[0xC3]).is_empty());
        // The dangling byte keeps the last line from parsing, so it is dropped.
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_separate_decoders_do_not_share_state() {
        let frame = data_frame("shared?");
        let bytes = frame.as_bytes();
        let mut first = FrameDecoder::new();
        let mut second = FrameDecoder::new();

        assert!(first.feed(&bytes[..10]).is_empty());
        assert!(second.feed(data_frame("no").as_bytes()).len() == 1);
        assert_eq!(first.feed(&bytes[10..]), vec!["shared?"]);
    }

    #[test]
    fn test_leading_bom_is_dropped() {
        let mut stream = b"\xEF\xBB\xBF".to_vec();
        stream.extend_from_slice(data_frame("first").as_bytes());
        stream.extend_from_slice(data_frame(" second").as_bytes());
        assert_eq!(decode_chunks(&[&stream]), vec!["first", " second"]);
    }

    #[test]
    fn test_bom_split_across_chunks_is_dropped() {
        let frame = data_frame("first");
        let deltas = decode_chunks(&[b"\xEF", b"\xBB\xBF", frame.as_bytes()]);
        assert_eq!(deltas, vec!["first"]);
    }

    #[test]
    fn test_bom_only_stripped_at_stream_start() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.feed(data_frame("a").as_bytes()), vec!["a"]);
        // A later BOM is ordinary text and spoils the line it starts.
        let mut late = b"\xEF\xBB\xBF".to_vec();
        late.extend_from_slice(data_frame("b").as_bytes());
        assert!(decoder.feed(&late).is_empty());
    }

    #[test]
    fn test_lone_bom_prefix_at_end_is_replaced() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(b"\xEF\xBB").is_empty());
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_final_flush_strips_carriage_return() {
        let frame = "data: {\"choices\":[{\"delta\":{\"content\":\"crlf tail\"}}]}\r";
        assert_eq!(decode_chunks(&[frame.as_bytes()]), vec!["crlf tail"]);
    }

    #[test]
    fn test_done_with_carriage_return_in_final_flush() {
        let mut stream = data_frame("kept");
        stream.push_str("data: {bad\n");
        stream.push_str("data: [DONE]\r");
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.feed(stream.as_bytes()), vec!["kept"]);
        assert!(decoder.finish().is_empty());
        assert!(decoder.is_done());
    }
}
