//! Keyword-driven theme tagging.

use regex::Regex;

use super::alternation;
use crate::error::Result;
use crate::types::{MatchMode, ThemeCatalog};

#[derive(Debug, Clone)]
struct CompiledTheme {
    name: String,
    // `None` for a rule with no usable keywords; it never matches.
    pattern: Option<Regex>,
}

/// Theme catalog compiled into one pattern per theme.
///
/// Keywords are lower-cased at compile time and matched against the
/// lower-cased body, so matching is case-insensitive while the patterns stay
/// plain literals.
#[derive(Debug, Clone)]
pub struct ThemeTagger {
    themes: Vec<CompiledTheme>,
}

impl ThemeTagger {
    pub fn new(catalog: &ThemeCatalog) -> Result<Self> {
        let mut themes = Vec::with_capacity(catalog.len());
        for rule in catalog.rules() {
            let lowered: Vec<String> = rule.keywords.iter().map(|k| k.to_lowercase()).collect();
            let whole_word = rule.match_mode == MatchMode::WholeWord;
            let pattern = match alternation(lowered.iter().map(String::as_str), whole_word) {
                Some(source) => Some(Regex::new(&source)?),
                None => {
                    tracing::warn!(
                        target = "postindex::themes",
                        theme = %rule.name,
                        "theme has no usable keywords"
                    );
                    None
                }
            };
            themes.push(CompiledTheme {
                name: rule.name.clone(),
                pattern,
            });
        }
        Ok(Self { themes })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.themes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    /// Names of every theme with at least one keyword hit, in catalog order.
    /// A name listed twice in the catalog is reported once.
    #[must_use]
    pub fn tag(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let lowered = text.to_lowercase();
        let mut matched: Vec<String> = Vec::new();
        for theme in &self.themes {
            let Some(pattern) = &theme.pattern else {
                continue;
            };
            if matched.iter().any(|name| name == &theme.name) {
                continue;
            }
            if pattern.is_match(&lowered) {
                matched.push(theme.name.clone());
            }
        }
        matched
    }
}
