//! `>>12345` quote references.

use once_cell::sync::OnceCell;

use super::{CompiledPattern, static_pattern};
use crate::types::PostId;

const QUOTE_PATTERN: &str = r">>([0-9]+)";

/// Referenced post ids in order of appearance. Repeats are kept; digit runs
/// that overflow [`PostId`] are dropped.
#[must_use]
pub fn extract_quotes(text: &str) -> Vec<PostId> {
    static QUOTE: OnceCell<CompiledPattern> = OnceCell::new();
    let Some(regex) = static_pattern(&QUOTE, QUOTE_PATTERN) else {
        return Vec::new();
    };
    regex
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|digits| digits.as_str().parse::<PostId>().ok())
        .collect()
}
