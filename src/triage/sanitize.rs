//! Output sanitization for model-produced categories.
//!
//! A gateway is supposed to mark failures with a sentinel, but nothing
//! forces every implementation to do so. A quota or transport error that
//! comes back as plain text must never be stored as a category.

use std::sync::LazyLock;

use regex::Regex;

/// Case-insensitive failure signatures. `429` is matched literally.
pub const ERROR_SIGNATURES: &[&str] = &["quota", "error", "rate limit", "exceeded", "429"];

static SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = ERROR_SIGNATURES
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){alternation}")).expect("valid signature regex")
});

/// Does this text look like a failure report rather than an answer?
pub fn looks_like_failure(text: &str) -> bool {
    SIGNATURE.is_match(text)
}

/// Turn a raw categorize response into a storable category.
///
/// Blank responses and anything matching a failure signature become `None`.
pub fn sanitize_category(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || looks_like_failure(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}
