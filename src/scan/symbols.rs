//! Symbol alias scanning for the mention timelines.
//!
//! Two kinds of pattern are compiled from the catalog: one alternation over
//! every alias of every symbol (answers "did this post mention any symbol") and
//! one alternation per symbol (answers "how many times was this symbol
//! mentioned"). Both are case-insensitive and word-bounded.

use regex::Regex;

use super::alternation;
use crate::error::Result;
use crate::types::SymbolCatalog;

#[derive(Debug, Clone)]
struct CompiledSymbol {
    id: String,
    pattern: Regex,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolMatcher {
    aggregate: Option<Regex>,
    symbols: Vec<CompiledSymbol>,
}

/// Result of scanning one post body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolHits {
    /// The aggregate pattern matched at least once.
    pub any_match: bool,
    /// `(symbol id, non-overlapping occurrence count)` for every symbol with hits,
    /// in catalog order.
    pub per_symbol: Vec<(String, u64)>,
}

impl SymbolHits {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.any_match && self.per_symbol.is_empty()
    }
}

fn case_insensitive(body: &str) -> String {
    format!("(?i){body}")
}

impl SymbolMatcher {
    pub fn new(catalog: &SymbolCatalog) -> Result<Self> {
        let aggregate = match alternation(
            catalog.iter().flat_map(|(_, entry)| entry.usable_aliases()),
            true,
        ) {
            Some(source) => Some(Regex::new(&case_insensitive(&source))?),
            None => None,
        };

        let mut symbols = Vec::with_capacity(catalog.len());
        for (id, entry) in catalog.iter() {
            let Some(source) = alternation(entry.usable_aliases(), true) else {
                tracing::debug!(target = "postindex::symbols", symbol = %id, "symbol has no usable aliases");
                continue;
            };
            symbols.push(CompiledSymbol {
                id: id.clone(),
                pattern: Regex::new(&case_insensitive(&source))?,
            });
        }

        Ok(Self { aggregate, symbols })
    }

    /// `true` when no alias can ever match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aggregate.is_none()
    }

    #[must_use]
    pub fn scan(&self, text: &str) -> SymbolHits {
        let Some(aggregate) = &self.aggregate else {
            return SymbolHits::default();
        };
        if text.trim().is_empty() {
            return SymbolHits::default();
        }
        let any_match = aggregate.is_match(text);
        let per_symbol = if any_match {
            self.symbols
                .iter()
                .filter_map(|symbol| {
                    let count = symbol.pattern.find_iter(text).count() as u64;
                    (count > 0).then(|| (symbol.id.clone(), count))
                })
                .collect()
        } else {
            Vec::new()
        };
        SymbolHits {
            any_match,
            per_symbol,
        }
    }
}
