//! Main chat loop orchestration.
//!
//! Reads lines from stdin, runs each as a turn through the chat service,
//! and keeps the conversation history in step with what was displayed.

use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info_span};

use buddy_core::chat::{ChatTurn, Conversation};
use buddy_observe::spans;
use buddy_types::chat::{ChatMode, ChatRequest, ChatRole};
use buddy_types::error::ChatError;

use crate::state::AppState;

use super::commands::{self, ChatCommand};
use super::input::{self, InputEvent};
use super::renderer::{LiveRenderer, print_turn_footer};

/// Run the interactive chat loop.
pub async fn run_chat_loop(state: &AppState, mode: Option<ChatMode>) -> anyhow::Result<()> {
    let mode = mode.unwrap_or(state.config.default_mode);
    let mut conversation = Conversation::new(mode, state.config.preferences.clone());

    println!();
    println!(
        "  {} {}",
        style("Buddy").cyan().bold(),
        style(format!("({mode} mode, /help for commands)")).dim()
    );
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_prompt();
        let line = match input::read_line(&mut lines, input::ctrl_c()).await? {
            InputEvent::Message(line) => line,
            InputEvent::Eof | InputEvent::Interrupted => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
        };
        let text = line.as_str();
        if text.is_empty() {
            continue;
        }

        let request = match commands::parse(text, conversation.chips().len()) {
            Some(ChatCommand::Help) => {
                commands::print_help();
                continue;
            }
            Some(ChatCommand::Exit) => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            Some(ChatCommand::History) => {
                print_history(&conversation);
                continue;
            }
            Some(ChatCommand::Unknown(cmd)) => {
                println!(
                    "\n  {} Unknown command: {}. Type /help for available commands.\n",
                    style("?").yellow().bold(),
                    style(cmd).dim()
                );
                continue;
            }
            Some(ChatCommand::Chip(index)) => match conversation.choose_chip(index) {
                Some(request) => {
                    if let Some(last) = conversation.messages().last() {
                        println!("  {} {}", style("You >").green().bold(), last.content);
                    }
                    request
                }
                None => continue,
            },
            None => conversation.push_user(text),
        };

        match run_turn(state, &request).await {
            Ok(turn) => {
                conversation.push_assistant(turn.display_text.clone(), turn.chips.clone());
                print_turn_footer(&turn);
                println!();
            }
            Err(e) => {
                eprintln!("\n  {} {}", style("!").red().bold(), e.user_message());
                eprintln!("  {}", style("Type a message to retry, /exit to quit.").dim());
                tracing::warn!(error = %e, "chat turn failed");
            }
        }
    }

    Ok(())
}

/// Stream one reply, cancelling it if Ctrl+C is pressed meanwhile.
pub async fn run_turn(state: &AppState, request: &ChatRequest) -> Result<ChatTurn, ChatError> {
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let span = info_span!(
        spans::CHAT_TURN,
        buddy.chat.mode = ?request.mode,
        buddy.chat.messages = request.messages.len(),
    );

    print!("\n  {} ", style("Buddy").cyan().bold());
    let mut renderer = LiveRenderer::new();
    let result = state
        .chat_service
        .send_turn(request, &cancel, |delta| {
            LiveRenderer::print(&renderer.push(delta));
        })
        .instrument(span)
        .await;
    watcher.abort();

    if let Ok(turn) = &result {
        // Anything the live view held back that the final parse shows.
        LiveRenderer::print(&renderer.advance(&turn.display_text));
    }
    println!();
    result
}

fn print_prompt() {
    use std::io::Write;
    print!("  {} ", style("You >").green().bold());
    let _ = std::io::stdout().flush();
}

fn print_history(conversation: &Conversation) {
    println!();
    for msg in conversation.messages() {
        let label = match msg.role {
            ChatRole::User => format!("{}", style("You").green()),
            ChatRole::Assistant => format!("{}", style("Buddy").cyan()),
        };
        let preview = if msg.content.chars().count() > 100 {
            format!("{}...", msg.content.chars().take(97).collect::<String>())
        } else {
            msg.content.clone()
        };
        println!("  {} {}", style(label).bold(), preview);
    }
    println!();
}
