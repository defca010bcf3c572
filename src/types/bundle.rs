//! The index bundle: every derived lookup structure for one corpus build.
//!
//! A bundle is assembled by [`crate::IndexBuilder`] and is immutable once
//! published. Query methods return empty results for unknown keys; the maps
//! themselves only ever hold keys that something was written under.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::post::PostId;
use super::symbol::SymbolEntry;
use crate::scan::time_bucket::TimeKey;

/// Digest identifying the inputs a bundle was built from.
pub type Fingerprint = [u8; 32];

static EMPTY_DAILY: BTreeMap<NaiveDate, u64> = BTreeMap::new();

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexBundle {
    pub(crate) fingerprint: Fingerprint,
    pub(crate) quotes_by_post: BTreeMap<PostId, Vec<PostId>>,
    pub(crate) quoted_by: BTreeMap<PostId, Vec<PostId>>,
    pub(crate) markers_by_token: BTreeMap<String, Vec<PostId>>,
    pub(crate) theme_to_posts: BTreeMap<String, Vec<PostId>>,
    pub(crate) themes_by_post: BTreeMap<PostId, Vec<String>>,
    pub(crate) time_hhmm: BTreeMap<String, Vec<PostId>>,
    pub(crate) time_hhmmss: BTreeMap<String, Vec<PostId>>,
    pub(crate) symbol_catalog: BTreeMap<String, SymbolEntry>,
    pub(crate) symbol_daily_total: BTreeMap<NaiveDate, u64>,
    pub(crate) per_symbol_daily: BTreeMap<String, BTreeMap<NaiveDate, u64>>,
}

/// Entry counts for logging and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleStats {
    pub quoting_posts: usize,
    pub quote_edges: usize,
    pub quoted_posts: usize,
    pub marker_tokens: usize,
    pub themed_posts: usize,
    pub themes: usize,
    pub minute_buckets: usize,
    pub second_buckets: usize,
    pub symbols: usize,
    pub symbol_days: usize,
}

impl IndexBundle {
    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Posts quoted by `post`, in order of appearance, repeats included.
    #[must_use]
    pub fn quotes_of(&self, post: PostId) -> &[PostId] {
        self.quotes_by_post.get(&post).map_or(&[], Vec::as_slice)
    }

    /// Posts quoting `post`; a post appears once per quote.
    #[must_use]
    pub fn quoted_by_of(&self, post: PostId) -> &[PostId] {
        self.quoted_by.get(&post).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn posts_with_marker(&self, token: &str) -> &[PostId] {
        self.markers_by_token.get(token).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn posts_with_theme(&self, theme: &str) -> &[PostId] {
        self.theme_to_posts.get(theme).map_or(&[], Vec::as_slice)
    }

    /// Theme tags assigned to `post`, in catalog order.
    #[must_use]
    pub fn themes_of(&self, post: PostId) -> &[String] {
        self.themes_by_post.get(&post).map_or(&[], Vec::as_slice)
    }

    /// Posts authored at a time of day, across all dates. Accepts `HH:MM` or
    /// `HH:MM:SS`; anything else yields no posts.
    #[must_use]
    pub fn posts_at_time(&self, key: &str) -> &[PostId] {
        let bucket = match TimeKey::parse(key) {
            Some(TimeKey::Minute(minute)) => self.time_hhmm.get(&minute),
            Some(TimeKey::Second(second)) => self.time_hhmmss.get(&second),
            None => None,
        };
        bucket.map_or(&[], Vec::as_slice)
    }

    /// Per date, the number of posts mentioning at least one symbol.
    #[must_use]
    pub fn symbol_daily_total(&self) -> &BTreeMap<NaiveDate, u64> {
        &self.symbol_daily_total
    }

    /// Per date, every alias occurrence of `symbol`.
    #[must_use]
    pub fn per_symbol_daily(&self, symbol: &str) -> &BTreeMap<NaiveDate, u64> {
        self.per_symbol_daily.get(symbol).unwrap_or(&EMPTY_DAILY)
    }

    #[must_use]
    pub fn symbol(&self, id: &str) -> Option<&SymbolEntry> {
        self.symbol_catalog.get(id)
    }

    pub fn marker_tokens(&self) -> impl Iterator<Item = &str> {
        self.markers_by_token.keys().map(String::as_str)
    }

    pub fn theme_names(&self) -> impl Iterator<Item = &str> {
        self.theme_to_posts.keys().map(String::as_str)
    }

    pub fn symbol_ids(&self) -> impl Iterator<Item = &str> {
        self.symbol_catalog.keys().map(String::as_str)
    }

    #[must_use]
    pub fn quotes_by_post(&self) -> &BTreeMap<PostId, Vec<PostId>> {
        &self.quotes_by_post
    }

    #[must_use]
    pub fn quoted_by(&self) -> &BTreeMap<PostId, Vec<PostId>> {
        &self.quoted_by
    }

    #[must_use]
    pub fn markers_by_token(&self) -> &BTreeMap<String, Vec<PostId>> {
        &self.markers_by_token
    }

    #[must_use]
    pub fn theme_to_posts(&self) -> &BTreeMap<String, Vec<PostId>> {
        &self.theme_to_posts
    }

    #[must_use]
    pub fn time_hhmm(&self) -> &BTreeMap<String, Vec<PostId>> {
        &self.time_hhmm
    }

    #[must_use]
    pub fn time_hhmmss(&self) -> &BTreeMap<String, Vec<PostId>> {
        &self.time_hhmmss
    }

    #[must_use]
    pub fn symbol_catalog(&self) -> &BTreeMap<String, SymbolEntry> {
        &self.symbol_catalog
    }

    #[must_use]
    pub fn stats(&self) -> BundleStats {
        BundleStats {
            quoting_posts: self.quotes_by_post.len(),
            quote_edges: self.quotes_by_post.values().map(Vec::len).sum(),
            quoted_posts: self.quoted_by.len(),
            marker_tokens: self.markers_by_token.len(),
            themed_posts: self.themes_by_post.len(),
            themes: self.theme_to_posts.len(),
            minute_buckets: self.time_hhmm.len(),
            second_buckets: self.time_hhmmss.len(),
            symbols: self.symbol_catalog.len(),
            symbol_days: self.symbol_daily_total.len(),
        }
    }
}
