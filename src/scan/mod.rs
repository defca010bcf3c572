//! Per-post text scanners.
//!
//! Each scanner is a pure function of one post's fields. Patterns that depend on
//! a catalog are compiled once when the catalog is handed over; the fixed quote
//! and marker patterns are compiled once per process.

pub mod markers;
pub mod quotes;
pub mod symbols;
pub mod themes;
pub mod time_bucket;

use once_cell::sync::OnceCell;
use regex::Regex;

pub use markers::extract_markers;
pub use quotes::extract_quotes;
pub use symbols::{SymbolHits, SymbolMatcher};
pub use themes::ThemeTagger;
pub use time_bucket::{TimeBuckets, TimeKey, bucket_keys};

type CompiledPattern = std::result::Result<Regex, String>;

/// Resolve a process-wide pattern, logging (once per call site) if it failed to
/// compile. Callers treat `None` as "no matches".
fn static_pattern(cell: &'static OnceCell<CompiledPattern>, source: &str) -> Option<&'static Regex> {
    match cell.get_or_init(|| Regex::new(source).map_err(|err| err.to_string())) {
        Ok(re) => Some(re),
        Err(msg) => {
            tracing::error!(target = "postindex::scan", pattern = source, error = %msg, "pattern init failed");
            None
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Escape `phrase` and anchor each edge that starts or ends with a word
/// character to a word boundary. Edges made of punctuation (`$xyz`, `c++`) are
/// left open because `\b` never matches between two non-word characters.
pub(crate) fn bounded_literal(phrase: &str) -> String {
    let mut pattern = String::with_capacity(phrase.len() + 8);
    if phrase.chars().next().is_some_and(is_word_char) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(phrase));
    if phrase.chars().next_back().is_some_and(is_word_char) {
        pattern.push_str(r"\b");
    }
    pattern
}

/// Alternation over `phrases`, longest first so a longer phrase wins when two
/// start at the same offset. Returns `None` when nothing usable remains.
pub(crate) fn alternation<'a, I>(phrases: I, whole_word: bool) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut unique: Vec<&str> = phrases
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    unique.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    unique.dedup();
    if unique.is_empty() {
        return None;
    }
    let branches: Vec<String> = unique
        .into_iter()
        .map(|p| {
            if whole_word {
                bounded_literal(p)
            } else {
                regex::escape(p)
            }
        })
        .collect();
    Some(format!("(?:{})", branches.join("|")))
}
