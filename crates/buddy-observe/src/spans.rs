//! Span names shared by every entry point.
//!
//! Field names follow the dotted `buddy.*` convention, e.g.
//! `info_span!(spans::CHAT_TURN, buddy.chat.mode = %mode)`.
//! Text deltas and directive payloads are health data and never go in a
//! span field.

/// One request/response turn against the chat endpoint.
pub const CHAT_TURN: &str = "buddy.chat.turn";

/// Replaying a captured event-stream transcript through the decoder.
pub const STREAM_REPLAY: &str = "buddy.stream.replay";

/// Running the response extractor over finished text.
pub const RESPONSE_PARSE: &str = "buddy.response.parse";

/// Service name reported to OpenTelemetry.
pub const TRACER_NAME: &str = "buddy";
