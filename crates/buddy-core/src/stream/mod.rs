//! Event-stream decoding.
//!
//! - `frame`: synchronous `FrameDecoder` state machine (bytes in, deltas out)
//! - `decode`: async drivers that pull chunks from a transport stream

pub mod decode;
pub mod frame;

pub use decode::{DecodeSummary, decode_stream, delta_stream};
pub use frame::FrameDecoder;
