//! Text processing utilities.

use std::sync::LazyLock;

use regex::Regex;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static LETTERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zA-Z]+").unwrap());

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Collapse a value into its shape: digit runs become `N`, then letter runs
/// become `A`.
pub fn extract_pattern(value: &str) -> String {
    let digits = DIGITS.replace_all(value, "N");
    LETTERS.replace_all(&digits, "A").into_owned()
}
