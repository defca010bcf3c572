//! Theme → keyword rules consumed by the theme tagger.

use serde::{Deserialize, Serialize};

/// How a keyword must sit inside the body to count as a hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Keyword edges that are word characters must meet a word boundary, so
    /// `dark` does not fire inside `darkroom`.
    #[default]
    WholeWord,
    /// Plain substring containment.
    Substring,
}

/// One named theme and the phrases that assign it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeRule {
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub match_mode: MatchMode,
}

impl ThemeRule {
    pub fn new<I, S>(name: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
            match_mode: MatchMode::WholeWord,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }
}

/// Ordered theme rules. Order only affects the order of tags on a post, never
/// which tags are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeCatalog {
    rules: Vec<ThemeRule>,
}

impl ThemeCatalog {
    #[must_use]
    pub fn new(rules: Vec<ThemeRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    #[must_use]
    pub fn rules(&self) -> &[ThemeRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn push(&mut self, rule: ThemeRule) {
        self.rules.push(rule);
    }
}

impl Default for ThemeCatalog {
    fn default() -> Self {
        Self::new(vec![
            ThemeRule::new(
                "Military",
                ["military", "troops", "general", "generals", "pentagon", "marines"],
            ),
            ThemeRule::new(
                "Elections",
                ["election", "elections", "ballot", "ballots", "voter", "voting", "midterms"],
            ),
            ThemeRule::new(
                "Intelligence",
                ["cia", "nsa", "fbi", "intelligence", "surveillance", "fisa"],
            ),
            ThemeRule::new(
                "Justice",
                ["doj", "indictment", "indictments", "sealed", "prosecutor", "grand jury"],
            ),
            ThemeRule::new(
                "Media",
                ["media", "news", "fake news", "press", "journalist", "reporters"],
            ),
            ThemeRule::new(
                "Finance",
                ["bank", "banks", "federal reserve", "treasury", "currency", "market"],
            ),
            ThemeRule::new(
                "Darkness",
                ["dark", "darkness", "shadow", "shadows", "light"],
            ),
            ThemeRule::new(
                "Communications",
                ["comms", "coded", "cipher", "encrypted", "signal", "message"],
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_roundtrips_through_json_with_default_mode() {
        let json = r#"[
            {"name": "Space", "keywords": ["orbit", "rocket"]},
            {"name": "Snow", "keywords": ["snow"], "match_mode": "substring"}
        ]"#;
        let catalog: ThemeCatalog = serde_json::from_str(json).expect("parse");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.rules()[0].match_mode, MatchMode::WholeWord);
        assert_eq!(catalog.rules()[1].match_mode, MatchMode::Substring);
    }

    #[test]
    fn default_catalog_has_unique_names() {
        let catalog = ThemeCatalog::default();
        let mut names: Vec<&str> = catalog.rules().iter().map(|r| r.name.as_str()).collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(before, names.len());
    }
}
