//! Text normalization and slug generation used by the identity engine

use unicode_normalization::UnicodeNormalization;

/// Maximum length of a NodeId hint
pub const HINT_MAX_LEN: usize = 32;

/// Tabs are expanded to this many spaces before whitespace is collapsed
pub const TAB_WIDTH: usize = 4;

/// Normalize text before hashing.
///
/// Applies NFC composition, expands tabs, collapses whitespace runs to a
/// single space and trims both ends.
pub fn normalize_text(text: &str) -> String {
    let composed: String = text.nfc().collect();
    let expanded = composed.replace('\t', &" ".repeat(TAB_WIDTH));
    expanded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build a short readable slug, or `fallback` when nothing survives.
///
/// Lowercases, keeps alphanumerics, whitespace and hyphens, joins words with
/// hyphens, truncates to [`HINT_MAX_LEN`] characters and drops trailing
/// hyphens.
pub fn slugify(text: &str, fallback: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    let joined = kept.split_whitespace().collect::<Vec<_>>().join("-");
    let truncated: String = joined.chars().take(HINT_MAX_LEN).collect();
    let trimmed = truncated.trim_end_matches('-');

    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
