//! CLI command definitions for the `buddy` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod decode;
pub mod parse;
pub mod send;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use buddy_types::chat::ChatMode;

/// Talk to Buddy, your health-journaling companion.
#[derive(Parser)]
#[command(name = "buddy", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session.
    Chat {
        /// Conversation flow (defaults to the configured mode).
        #[arg(long)]
        mode: Option<ChatMode>,

        /// Chat endpoint URL (overrides config.toml).
        #[arg(long, env = "BUDDY_ENDPOINT")]
        endpoint: Option<String>,
    },

    /// Send a single message and print the reply.
    Send {
        /// Message text.
        message: String,

        /// Conversation flow (defaults to the configured mode).
        #[arg(long)]
        mode: Option<ChatMode>,

        /// Chat endpoint URL (overrides config.toml).
        #[arg(long, env = "BUDDY_ENDPOINT")]
        endpoint: Option<String>,
    },

    /// Extract directives and chips from a finished response.
    Parse {
        /// File holding the response text (reads stdin if omitted).
        file: Option<PathBuf>,
    },

    /// Replay a captured event-stream transcript through the decoder.
    Decode {
        /// Transcript file (reads stdin if omitted).
        file: Option<PathBuf>,

        /// Feed the decoder this many bytes at a time.
        #[arg(long, default_value_t = 64, value_parser = clap::value_parser!(u64).range(1..))]
        chunk_size: u64,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Read `file`, or all of stdin when no file is given.
pub async fn read_input(file: Option<&std::path::Path>) -> anyhow::Result<Vec<u8>> {
    use tokio::io::AsyncReadExt;

    match file {
        Some(path) => tokio::fs::read(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display())),
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            Ok(buf)
        }
    }
}
