//! Externally supplied symbol catalog (ticker/alias → description).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Aliases and description of one tracked symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    #[serde(default)]
    pub description: String,
}

impl SymbolEntry {
    pub fn new<I, S>(aliases: I, description: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
            description: description.into(),
        }
    }

    /// Aliases that can actually match text (blank entries are dropped).
    pub fn usable_aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases
            .iter()
            .map(|alias| alias.trim())
            .filter(|alias| !alias.is_empty())
    }
}

/// Symbol id → entry. An empty catalog is valid and yields empty timelines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolCatalog {
    entries: BTreeMap<String, SymbolEntry>,
}

impl SymbolCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, entry: SymbolEntry) -> Option<SymbolEntry> {
        self.entries.insert(id.into(), entry)
    }

    #[must_use]
    pub fn with_symbol(mut self, id: impl Into<String>, entry: SymbolEntry) -> Self {
        self.insert(id, entry);
        self
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SymbolEntry> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SymbolEntry)> {
        self.entries.iter()
    }

    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<String, SymbolEntry> {
        &self.entries
    }
}

impl From<BTreeMap<String, SymbolEntry>> for SymbolCatalog {
    fn from(entries: BTreeMap<String, SymbolEntry>) -> Self {
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_parses_alias_lists() {
        let json = r#"{
            "XYZ": {"aliases": ["xyz", "ex-why-zee", "  "], "description": "Example"},
            "ABC": {"aliases": []}
        }"#;
        let catalog: SymbolCatalog = serde_json::from_str(json).expect("parse");
        assert_eq!(catalog.len(), 2);
        let xyz = catalog.get("XYZ").expect("xyz");
        assert_eq!(xyz.description, "Example");
        assert_eq!(
            xyz.usable_aliases().collect::<Vec<_>>(),
            vec!["ex-why-zee", "xyz"]
        );
        assert!(catalog.get("ABC").expect("abc").description.is_empty());
    }
}
