//! `[Marker]` bracketed tokens.

use std::collections::HashSet;

use once_cell::sync::OnceCell;

use super::{CompiledPattern, static_pattern};

// Shortest run up to the next `]` on the same line.
const MARKER_PATTERN: &str = r"\[([^\]\n]*)\]";

/// Trimmed marker tokens, unique within the text, in first-appearance order.
/// Case is preserved; tokens that trim to nothing are dropped.
#[must_use]
pub fn extract_markers(text: &str) -> Vec<String> {
    static MARKER: OnceCell<CompiledPattern> = OnceCell::new();
    let Some(regex) = static_pattern(&MARKER, MARKER_PATTERN) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    for caps in regex.captures_iter(text) {
        let Some(inner) = caps.get(1) else { continue };
        let token = inner.as_str().trim();
        if token.is_empty() {
            continue;
        }
        if seen.insert(token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}
