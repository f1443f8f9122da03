//! Prompt input for the chat loop.
//!
//! Reads lines from stdin while watching for Ctrl+C. An interrupt at the
//! prompt ends the session; during a reply it only stops that reply.

use std::future::Future;

use tokio::io::{AsyncBufRead, Lines};

/// Events produced while waiting at the prompt.
#[derive(Debug, PartialEq)]
pub enum InputEvent {
    /// User submitted a line (trimmed).
    Message(String),
    /// End of input (Ctrl+D).
    Eof,
    /// Interrupt signal (Ctrl+C).
    Interrupted,
}

/// Wait for the next line, or for `interrupt` to resolve first.
pub async fn read_line<R, F>(lines: &mut Lines<R>, interrupt: F) -> std::io::Result<InputEvent>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    tokio::select! {
        biased;
        line = lines.next_line() => Ok(match line? {
            Some(line) => InputEvent::Message(line.trim().to_string()),
            None => InputEvent::Eof,
        }),
        () = interrupt => Ok(InputEvent::Interrupted),
    }
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::debug!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    use super::*;

    #[tokio::test]
    async fn test_line_is_trimmed_message() {
        let (client, mut server) = tokio::io::duplex(64);
        server.write_all(b"  my knee hurts \n").await.unwrap();
        let mut lines = BufReader::new(client).lines();

        let event = read_line(&mut lines, std::future::pending()).await.unwrap();
        assert_eq!(event, InputEvent::Message("my knee hurts".into()));
    }

    #[tokio::test]
    async fn test_interrupt_while_waiting_ends_input() {
        // Keep the writer alive so the reader is still waiting.
        let (client, _server) = tokio::io::duplex(64);
        let mut lines = BufReader::new(client).lines();

        let event = read_line(&mut lines, std::future::ready(())).await.unwrap();
        assert_eq!(event, InputEvent::Interrupted);
    }

    #[tokio::test]
    async fn test_interrupt_after_a_turn_still_ends_input() {
        let (client, mut server) = tokio::io::duplex(64);
        server.write_all(b"hello\n").await.unwrap();
        let mut lines = BufReader::new(client).lines();

        let first = read_line(&mut lines, std::future::pending()).await.unwrap();
        assert_eq!(first, InputEvent::Message("hello".into()));
        let second = read_line(&mut lines, std::future::ready(())).await.unwrap();
        assert_eq!(second, InputEvent::Interrupted);
    }

    #[tokio::test]
    async fn test_closed_input_is_eof() {
        let (client, server) = tokio::io::duplex(64);
        drop(server);
        let mut lines = BufReader::new(client).lines();

        let event = read_line(&mut lines, std::future::pending()).await.unwrap();
        assert_eq!(event, InputEvent::Eof);
    }
}
