//! Response post-processing: pull directives out of assembled assistant text.
//!
//! - `sentinel`: `[ENTRY_SAVE]`/`[INTAKE_COMPLETE]` JSON payload regions
//! - `chips`: the `CHIPS:` quick-reply line
//!
//! Everything here is pure. "Not found" and "malformed JSON" are ordinary
//! outcomes, reported as absent data rather than errors.

pub mod chips;
pub mod sentinel;

use serde::Serialize;

use buddy_types::record::{RecordKind, RecordPayload};

pub use chips::{ChipExtraction, extract_chips};
pub use sentinel::{Extraction, Sentinel, extract_structured};

/// Errors from building a custom [`Sentinel`].
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("sentinel markers must not be empty")]
    EmptyMarker,

    #[error("invalid sentinel pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Everything the UI and persistence layers need from one response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedResponse {
    pub display_text: String,
    pub chips: Vec<String>,
    pub entry: Option<RecordPayload>,
    pub intake: Option<RecordPayload>,
}

impl ParsedResponse {
    /// Extracted records paired with their kind, entry first.
    pub fn records(&self) -> impl Iterator<Item = (RecordKind, &RecordPayload)> {
        [
            (RecordKind::EntrySave, self.entry.as_ref()),
            (RecordKind::IntakeComplete, self.intake.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, payload)| payload.map(|p| (kind, p)))
    }
}

/// Run every extractor over a finished response.
///
/// Structured payloads come out first so chip-like text inside a payload
/// cannot be mistaken for the directive line; chips are parsed from what
/// remains.
pub fn parse_response(full_text: &str) -> ParsedResponse {
    let entry = extract_structured(full_text, Sentinel::entry_save());
    let intake = extract_structured(&entry.display_text, Sentinel::intake_complete());
    let chips = extract_chips(&intake.display_text);

    ParsedResponse {
        display_text: chips.display_text,
        chips: chips.chips,
        entry: entry.payload,
        intake: intake.payload,
    }
}

/// Text to show while a response is still streaming in.
///
/// Removes what [`parse_response`] will remove (the first complete region of
/// each kind and the first chip line) and hides what may yet turn into a
/// directive: an unterminated region from its begin marker on, a begin marker
/// that is only partly received, and a trailing chip line still arriving.
/// Once the response is complete the result equals the final display text.
pub fn live_display_text(partial: &str) -> String {
    let mut text = partial.to_string();

    for kind in RecordKind::ALL {
        let sentinel = Sentinel::for_kind(kind);
        text = sentinel.strip_first(&text);
        let unterminated = text
            .match_indices(sentinel.begin())
            .map(|(open, _)| open)
            .find(|&open| !sentinel.has_region(&text[open..]));
        if let Some(open) = unterminated {
            text.truncate(open);
        }
        truncate_partial_marker(&mut text, sentinel.begin());
    }

    let mut text = chips::CHIP_DIRECTIVE.replace(&text, "").into_owned();
    truncate_partial_chip_line(&mut text);
    text.trim().to_string()
}

/// Drop a trailing proper prefix of `marker` (e.g. `"[ENTRY_S"`).
fn truncate_partial_marker(text: &mut String, marker: &str) {
    for len in (1..marker.len()).rev() {
        if text.ends_with(&marker[..len]) {
            let keep = text.len() - len;
            text.truncate(keep);
            return;
        }
    }
}

/// Drop an unterminated last line that is, or may become, a chip line.
fn truncate_partial_chip_line(text: &mut String) {
    let line_start = text.rfind('\n').map_or(0, |i| i + 1);
    let last_line = &text[line_start..];
    let chip_like = last_line.starts_with(chips::CHIPS_PREFIX)
        || chips::CHIPS_PREFIX.starts_with(last_line);
    if !last_line.is_empty() && chip_like {
        text.truncate(line_start);
    }
}
