//! In-memory transcript of one chat session.

use buddy_types::chat::{ChatMessage, ChatMode, ChatRequest};
use buddy_types::record::RecordPayload;

/// Message history plus the settings sent with every turn.
///
/// The history holds what the user saw: assistant turns are recorded by
/// their display text, with directives already stripped.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    mode: ChatMode,
    preferences: RecordPayload,
    chips: Vec<String>,
}

impl Conversation {
    pub fn new(mode: ChatMode, preferences: RecordPayload) -> Self {
        Self {
            messages: Vec::new(),
            mode,
            preferences,
            chips: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Quick replies offered by the latest assistant turn.
    pub fn chips(&self) -> &[String] {
        &self.chips
    }

    /// Append a user message and build the request for the next turn.
    ///
    /// Offered chips are withdrawn once the user speaks.
    pub fn push_user(&mut self, content: impl Into<String>) -> ChatRequest {
        self.chips.clear();
        self.messages.push(ChatMessage::user(content));
        self.request()
    }

    /// Send the chip at `index` (zero-based) as the next user message.
    ///
    /// Returns `None` if no such chip is on offer.
    pub fn choose_chip(&mut self, index: usize) -> Option<ChatRequest> {
        let chip = self.chips.get(index)?.clone();
        Some(self.push_user(chip))
    }

    /// Record the assistant's reply and the chips it offered.
    ///
    /// An empty reply (e.g. cancelled before any text) is not recorded.
    pub fn push_assistant(&mut self, display_text: impl Into<String>, chips: Vec<String>) {
        let display_text = display_text.into();
        if !display_text.is_empty() {
            self.messages.push(ChatMessage::assistant(display_text));
        }
        self.chips = chips;
    }

    /// Request carrying the full history, mode, and preferences.
    pub fn request(&self) -> ChatRequest {
        ChatRequest::new(self.messages.clone())
            .with_mode(self.mode)
            .with_preferences(self.preferences.clone())
    }
}
