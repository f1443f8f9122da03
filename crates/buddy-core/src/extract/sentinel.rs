//! Sentinel-delimited structured payload extraction.
//!
//! A directive looks like this inside the assistant text:
//!
//! ```text
//! Got it! I'll log that for you.
//! [ENTRY_SAVE]
//! {"pain_level": 7, "body_regions": ["lower back"]}
//! [/ENTRY_SAVE]
//! ```
//!
//! Matching is non-greedy and spans newlines: the region runs from the first
//! begin marker to the first end marker after it. Only that first region is
//! extracted; a second region of the same kind stays in the text.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use buddy_types::record::{RecordKind, RecordPayload};

use super::ExtractError;

/// A compiled begin/end marker pair.
#[derive(Debug, Clone)]
pub struct Sentinel {
    begin: String,
    end: String,
    pattern: Regex,
}

static ENTRY_SAVE: LazyLock<Sentinel> = LazyLock::new(|| builtin(RecordKind::EntrySave));
static INTAKE_COMPLETE: LazyLock<Sentinel> =
    LazyLock::new(|| builtin(RecordKind::IntakeComplete));

fn builtin(kind: RecordKind) -> Sentinel {
    Sentinel::new(kind.begin_marker(), kind.end_marker())
        .expect("built-in sentinel markers compile")
}

impl Sentinel {
    /// Compile a marker pair. Markers are matched literally.
    pub fn new(begin: &str, end: &str) -> Result<Self, ExtractError> {
        if begin.is_empty() || end.is_empty() {
            return Err(ExtractError::EmptyMarker);
        }
        let pattern = Regex::new(&format!(
            r"(?s){}(.*?){}",
            regex::escape(begin),
            regex::escape(end)
        ))?;
        Ok(Self {
            begin: begin.to_string(),
            end: end.to_string(),
            pattern,
        })
    }

    /// `[ENTRY_SAVE]` ... `[/ENTRY_SAVE]`
    pub fn entry_save() -> &'static Sentinel {
        &ENTRY_SAVE
    }

    /// `[INTAKE_COMPLETE]` ... `[/INTAKE_COMPLETE]`
    pub fn intake_complete() -> &'static Sentinel {
        &INTAKE_COMPLETE
    }

    pub fn for_kind(kind: RecordKind) -> &'static Sentinel {
        match kind {
            RecordKind::EntrySave => Self::entry_save(),
            RecordKind::IntakeComplete => Self::intake_complete(),
        }
    }

    pub fn begin(&self) -> &str {
        &self.begin
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    /// Remove the first complete region from `text`, as extraction would.
    pub(crate) fn strip_first(&self, text: &str) -> String {
        self.pattern.replace(text, "").into_owned()
    }

    /// Whether `text` contains a complete region.
    pub(crate) fn has_region(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Result of [`extract_structured`].
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Input with the first marker region removed, trimmed.
    pub display_text: String,
    /// Parsed interior, if it was a JSON object.
    pub payload: Option<RecordPayload>,
    /// A marker region was found (even if its interior did not parse).
    pub matched: bool,
}

/// Extract the first structured payload delimited by `sentinel`.
///
/// No region: input returned unchanged, `payload` is `None`. Region found:
/// it is removed from the text either way, and `payload` is the interior
/// parsed as a JSON object, or `None` if the interior is not valid JSON or
/// not an object.
pub fn extract_structured(text: &str, sentinel: &Sentinel) -> Extraction {
    let Some((region, interior)) = sentinel
        .pattern
        .captures(text)
        .and_then(|caps| Some((caps.get(0)?, caps.get(1)?)))
    else {
        return Extraction {
            display_text: text.to_string(),
            payload: None,
            matched: false,
        };
    };
    let interior = interior.as_str().trim();

    let payload = match serde_json::from_str::<serde_json::Value>(interior) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        Ok(_) => {
            debug!(marker = %sentinel.begin, "directive payload is not a JSON object");
            None
        }
        Err(e) => {
            debug!(marker = %sentinel.begin, error = %e, "directive payload is not valid JSON");
            None
        }
    };

    let mut display_text = String::with_capacity(text.len() - region.len());
    display_text.push_str(&text[..region.start()]);
    display_text.push_str(&text[region.end()..]);

    Extraction {
        display_text: display_text.trim().to_string(),
        payload,
        matched: true,
    }
}
