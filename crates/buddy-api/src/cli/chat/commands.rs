//! Slash command and quick-reply parsing for the chat loop.

use console::style;

/// What a line typed at the prompt means.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Exit the chat session.
    Exit,
    /// Show the conversation so far.
    History,
    /// Send the chip with this zero-based index.
    Chip(usize),
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a command or chip selection.
///
/// A bare number selects a chip, but only while `chip_count` chips are on
/// offer and the number is in range; otherwise it is an ordinary message and
/// `None` is returned.
pub fn parse(input: &str, chip_count: usize) -> Option<ChatCommand> {
    let trimmed = input.trim();

    if let Ok(n) = trimmed.parse::<usize>() {
        return (1..=chip_count)
            .contains(&n)
            .then(|| ChatCommand::Chip(n - 1));
    }

    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed.split_whitespace().next().unwrap_or(trimmed).to_lowercase();
    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/history" => Some(ChatCommand::History),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}      {}", style("/help").cyan(), "Show this help message");
    println!("  {}   {}", style("/history").cyan(), "Show the conversation so far");
    println!("  {}      {}", style("/exit").cyan(), "End the chat session");
    println!("  {}         {}", style("1-9").cyan(), "Send a numbered quick reply");
    println!();
    println!(
        "  {}",
        style("Ctrl+C stops a reply mid-stream, or exits at the prompt. Ctrl+D exits.").dim()
    );
    println!();
}
