//! Common utilities and helper functions
//!
//! Text normalization shared by the override matcher and the CLI output.

use regex::Regex;
use std::sync::OnceLock;

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Normalize a topic title for keyword matching
///
/// Lowercases, replaces punctuation with spaces and collapses whitespace,
/// so `"Organic Chem: Part-2"` becomes `"organic chem part 2"`.
pub fn normalize_title(title: &str) -> String {
    static PUNCT_RE: OnceLock<Regex> = OnceLock::new();

    let re = PUNCT_RE.get_or_init(|| Regex::new(r"[^\p{L}\p{N}\s]+").expect("Invalid regex pattern"));

    let lowered = title.to_lowercase();
    normalize_whitespace(&re.replace_all(&lowered, " "))
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

/// Format an hour amount, dropping a trailing `.0`
pub fn format_hours(hours: f64) -> String {
    if (hours - hours.round()).abs() < 1e-9 {
        format!("{}h", hours.round() as i64)
    } else {
        format!("{hours:.1}h")
    }
}
