//! `buddy send`: one non-interactive turn.

use console::style;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info_span};

use buddy_core::chat::Conversation;
use buddy_observe::spans;
use buddy_types::chat::ChatMode;

use crate::state::AppState;

use super::chat::loop_runner::run_turn;
use super::chat::renderer::{print_turn_footer, turn_json};

/// Send `message` as a fresh conversation and print the reply.
///
/// Styled output streams live; `--json` and `--quiet` wait for the whole
/// reply.
pub async fn send(
    state: &AppState,
    message: &str,
    mode: Option<ChatMode>,
    json: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let mode = mode.unwrap_or(state.config.default_mode);
    let mut conversation = Conversation::new(mode, state.config.preferences.clone());
    let request = conversation.push_user(message);

    if !json && !quiet {
        let turn = run_turn(state, &request).await?;
        print_turn_footer(&turn);
        return Ok(());
    }

    let span = info_span!(
        spans::CHAT_TURN,
        buddy.chat.mode = %mode,
        buddy.chat.messages = request.messages.len(),
    );
    let cancel = CancellationToken::new();
    let turn = state
        .chat_service
        .send_turn(&request, &cancel, |_| {})
        .instrument(span)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&turn_json(&turn))?);
    } else {
        println!("{}", turn.display_text);
        for error in &turn.store_errors {
            eprintln!("{} Could not save record: {error}", style("!").red().bold());
        }
    }
    Ok(())
}
