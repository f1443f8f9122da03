//! `buddy decode`: replay a captured event-stream transcript offline.
//!
//! Useful for checking what the decoder makes of a wire capture, and that
//! the result does not depend on how the bytes were chunked.

use console::style;
use futures_util::stream;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info_span};

use buddy_core::stream::{DecodeSummary, decode_stream};
use buddy_observe::spans;

use super::read_input;

pub async fn decode(
    file: Option<&std::path::Path>,
    chunk_size: u64,
    json: bool,
) -> anyhow::Result<()> {
    let input = read_input(file).await?;
    let chunk_size = usize::try_from(chunk_size)?;

    let span = info_span!(
        spans::STREAM_REPLAY,
        buddy.input.bytes = input.len(),
        buddy.stream.chunk_size = chunk_size,
    );
    let (text, summary) = replay(&input, chunk_size).instrument(span).await;

    if json {
        let out = serde_json::json!({
            "text": text,
            "deltas": summary.deltas,
            "bytes": summary.bytes,
            "saw_done": summary.saw_done,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{text}");
        eprintln!(
            "{} {} deltas from {} bytes in {chunk_size}-byte chunks{}",
            style("*").cyan().bold(),
            summary.deltas,
            summary.bytes,
            if summary.saw_done { "" } else { " (no [DONE] frame)" }
        );
    }
    Ok(())
}

/// Feed `input` to the decoder `chunk_size` bytes at a time.
pub async fn replay(input: &[u8], chunk_size: usize) -> (String, DecodeSummary) {
    let chunks = input
        .chunks(chunk_size.max(1))
        .map(Ok::<_, std::convert::Infallible>);
    let cancel = CancellationToken::new();
    let mut text = String::new();
    let summary = decode_stream(stream::iter(chunks), &cancel, |delta| text.push_str(delta)).await;
    (text, summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSCRIPT: &str = concat!(
        ": ping\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hello \"}}]}\n",
        "\n",
        "event: ignored\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"caf\u{e9}\"}}]}\n",
        "data: [DONE]\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
    );

    #[tokio::test]
    async fn test_replay_is_chunk_invariant() {
        for size in [1, 2, 3, 7, 64, TRANSCRIPT.len()] {
            let (text, summary) = replay(TRANSCRIPT.as_bytes(), size).await;
            assert_eq!(text, "Hello café", "chunk size {size}");
            assert!(summary.saw_done);
            assert_eq!(summary.deltas, 2);
        }
    }

    #[tokio::test]
    async fn test_replay_empty_input() {
        let (text, summary) = replay(b"", 16).await;
        assert!(text.is_empty());
        assert_eq!(summary, DecodeSummary::default());
    }
}
