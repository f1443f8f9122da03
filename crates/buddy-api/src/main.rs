//! Buddy CLI entry point.
//!
//! Binary name: `buddy`
//!
//! Parses CLI arguments, sets up tracing, then dispatches to the command
//! handler. Only `chat` and `send` touch the network.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,buddy=debug",
        _ => "trace",
    };
    buddy_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    buddy_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(shell, &mut cmd, "buddy", &mut std::io::stdout());
        }

        Commands::Parse { file } => {
            cli::parse::parse(file.as_deref(), cli.json).await?;
        }

        Commands::Decode { file, chunk_size } => {
            cli::decode::decode(file.as_deref(), chunk_size, cli.json).await?;
        }

        Commands::Send {
            message,
            mode,
            endpoint,
        } => {
            let state = AppState::init(endpoint).await?;
            cli::send::send(&state, &message, mode, cli.json, cli.quiet).await?;
        }

        Commands::Chat { mode, endpoint } => {
            let state = AppState::init(endpoint).await?;
            cli::chat::loop_runner::run_chat_loop(&state, mode).await?;
        }
    }

    Ok(())
}
