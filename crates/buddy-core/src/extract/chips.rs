//! Quick-reply chip directive.
//!
//! The assistant ends a message with one line such as
//! `CHIPS:Sleep|Walking|Work|Mood`. The directive must start a line; a
//! "CHIPS:" in the middle of a sentence is ordinary text.

use std::sync::LazyLock;

use regex::Regex;

/// Prefix that opens the chip directive line.
pub const CHIPS_PREFIX: &str = "CHIPS:";

/// First directive line, its list captured, plus its line break.
pub(crate) static CHIP_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^CHIPS:[ \t]*(.+)$\n?").expect("chip directive pattern compiles")
});

/// Result of [`extract_chips`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChipExtraction {
    /// Input with the directive line removed, trimmed.
    pub display_text: String,
    /// Suggestions in display order. Empty pieces dropped, no dedup.
    pub chips: Vec<String>,
}

/// Extract the first chip directive line.
///
/// Without a directive the text is returned unchanged and `chips` is empty.
pub fn extract_chips(text: &str) -> ChipExtraction {
    let Some((line, list)) = CHIP_DIRECTIVE
        .captures(text)
        .and_then(|caps| Some((caps.get(0)?, caps.get(1)?)))
    else {
        return ChipExtraction {
            display_text: text.to_string(),
            chips: Vec::new(),
        };
    };

    let chips = split_chips(list.as_str());

    let mut display_text = String::with_capacity(text.len() - line.len());
    display_text.push_str(&text[..line.start()]);
    display_text.push_str(&text[line.end()..]);

    ChipExtraction {
        display_text: display_text.trim().to_string(),
        chips,
    }
}

/// Split a pipe-delimited list, trimming pieces and dropping empty ones.
pub fn split_chips(list: &str) -> Vec<String> {
    list.split('|')
        .map(str::trim)
        .filter(|chip| !chip.is_empty())
        .map(str::to_string)
        .collect()
}
