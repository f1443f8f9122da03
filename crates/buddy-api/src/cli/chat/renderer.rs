//! Terminal output for streamed replies.
//!
//! While a reply streams, the raw text is re-run through
//! [`live_display_text`] after every delta and only the newly visible suffix
//! is printed. Directive regions and chip lines therefore never reach the
//! terminal, even briefly.

use std::io::Write;

use console::style;

use buddy_core::chat::ChatTurn;
use buddy_core::extract::live_display_text;

/// Incremental printer for one streaming reply.
#[derive(Debug, Default)]
pub struct LiveRenderer {
    raw: String,
    shown: String,
}

impl LiveRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a delta and return the text that became visible because of it.
    pub fn push(&mut self, delta: &str) -> String {
        self.raw.push_str(delta);
        let visible = live_display_text(&self.raw);
        self.advance(&visible)
    }

    /// Return whatever of `visible` has not been shown yet.
    ///
    /// Visible text only ever grows by appending. If it ever stops extending
    /// what was shown, nothing more is printed for this reply.
    pub fn advance(&mut self, visible: &str) -> String {
        match visible.strip_prefix(self.shown.as_str()) {
            Some(fresh) if !fresh.is_empty() => {
                let fresh = fresh.to_string();
                self.shown.push_str(&fresh);
                fresh
            }
            _ => String::new(),
        }
    }

    pub fn shown(&self) -> &str {
        &self.shown
    }

    /// Print `fresh` and flush so partial lines appear immediately.
    pub fn print(fresh: &str) {
        if fresh.is_empty() {
            return;
        }
        print!("{}", fresh.replace('\n', "\n  "));
        let _ = std::io::stdout().flush();
    }
}

/// Print the chips and saved records that follow a finished reply.
pub fn print_turn_footer(turn: &ChatTurn) {
    if !turn.chips.is_empty() {
        println!();
        for (i, chip) in turn.chips.iter().enumerate() {
            println!("  {} {}", style(format!("[{}]", i + 1)).cyan().bold(), chip);
        }
    }

    for record in &turn.saved {
        println!(
            "  {} Saved {} ({} field{})",
            style("*").green().bold(),
            style(record.kind).bold(),
            record.payload.len(),
            if record.payload.len() == 1 { "" } else { "s" }
        );
    }

    for error in &turn.store_errors {
        eprintln!("  {} Could not save record: {error}", style("!").red().bold());
    }

    if turn.cancelled() {
        println!("  {}", style("(cancelled)").dim());
    }
}

/// JSON view of a finished turn for `--json` output.
pub fn turn_json(turn: &ChatTurn) -> serde_json::Value {
    serde_json::json!({
        "display_text": turn.display_text,
        "chips": turn.chips,
        "entry": turn.entry,
        "intake": turn.intake,
        "saved": turn.saved,
        "store_errors": turn.store_errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        "saw_done": turn.summary.saw_done,
        "cancelled": turn.summary.cancelled,
        "interrupted": turn.summary.interrupted,
    })
}
