//! Text normalization helpers shared by the dialect parsers.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MULTI_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Consolidated-text markers such as `▼B` or `▼M3`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CONSOLIDATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"▼[A-Z]\d*").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SPACE_BEFORE_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,!?;:'])").expect("valid regex"));

/// Normalize extracted text.
///
/// Applies NFC, turns line breaks and tabs into spaces, collapses runs of
/// spaces and trims. Non-breaking spaces are kept.
///
/// # Examples
/// ```
/// use legaljson::text::normalize;
///
/// assert_eq!(normalize("  Having regard\n\tto   the Treaty "), "Having regard to the Treaty");
/// assert_eq!(normalize("13\u{a0}March"), "13\u{a0}March");
/// ```
pub fn normalize(text: &str) -> String {
    let composed: String = text.nfc().collect();
    let flat = composed.replace(['\n', '\r', '\t'], " ");
    MULTI_SPACE.replace_all(&flat, " ").trim().to_string()
}

/// Remove line breaks and tabs outright, then collapse spaces.
///
/// Formex splits words across lines only at element boundaries, so the
/// control characters are dropped rather than turned into spaces.
pub fn strip_control(text: &str) -> String {
    let stripped = text.replace(['\n', '\r', '\t'], "");
    MULTI_SPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Collapse every whitespace run (including NBSP) into a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Map typographic quotes to ASCII and NBSP to a space, then collapse whitespace.
///
/// # Examples
/// ```
/// use legaljson::text::normalize_quotes;
///
/// assert_eq!(normalize_quotes("the \u{201c}Act\u{201d}\u{a0}of"), "the \"Act\" of");
/// ```
pub fn normalize_quotes(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201c}' | '\u{201d}' => '"',
            '\u{a0}' => ' ',
            other => other,
        })
        .collect();
    collapse_whitespace(&mapped)
}

/// Clean legacy portal text: drop consolidation markers, collapse whitespace
/// and remove stray spaces before punctuation.
///
/// # Examples
/// ```
/// use legaljson::text::clean_legacy;
///
/// assert_eq!(clean_legacy("▼M1 This Regulation ,  shall apply ."), "This Regulation, shall apply.");
/// ```
pub fn clean_legacy(text: &str) -> String {
    let unmarked = CONSOLIDATION_MARKER.replace_all(text, "");
    let collapsed = collapse_whitespace(&unmarked);
    SPACE_BEFORE_PUNCTUATION
        .replace_all(&collapsed, "$1")
        .to_string()
}

/// Join non-empty parts with a separator.
pub fn join_non_empty<I, S>(parts: I, separator: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .filter(|p| !p.as_ref().is_empty())
        .map(|p| p.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

/// `Some(text)` unless the text is empty.
pub fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
