//! One-pass bundle construction.
//!
//! Every post is reduced to a [`PostContribution`] independently of every other
//! post, then contributions are folded into a fresh [`IndexBundle`] in store
//! order. Only the map step may run in parallel; the fold is single-threaded,
//! so parallel and serial builds produce identical bundles.

use std::time::Instant;

use blake3::Hasher;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scan::{
    SymbolHits, SymbolMatcher, ThemeTagger, TimeBuckets, bucket_keys, extract_markers,
    extract_quotes,
};
use crate::types::{
    Fingerprint, IndexBundle, MatchMode, PostId, PostRecord, PostStore, SymbolCatalog,
    ThemeCatalog,
};

const FINGERPRINT_DOMAIN: &[u8] = b"postindex.bundle.v1";

/// Everything one post adds to the bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostContribution {
    pub post: PostId,
    pub quotes: Vec<PostId>,
    pub markers: Vec<String>,
    pub themes: Vec<String>,
    pub time: Option<TimeBuckets>,
    pub date: Option<NaiveDate>,
    pub symbols: SymbolHits,
}

/// Counters describing a finished build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub posts: usize,
    pub indexed: usize,
    pub skipped_missing_id: usize,
    pub missing_timestamp: usize,
    pub blank_text: usize,
    pub duration_ms: u64,
}

/// Compiled extractors plus the catalogs they were compiled from.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    themes: ThemeTagger,
    theme_catalog: ThemeCatalog,
    symbols: SymbolMatcher,
    symbol_catalog: SymbolCatalog,
    parallel: bool,
}

impl IndexBuilder {
    pub fn new(themes: &ThemeCatalog, symbols: SymbolCatalog) -> Result<Self> {
        Ok(Self {
            themes: ThemeTagger::new(themes)?,
            theme_catalog: themes.clone(),
            symbols: SymbolMatcher::new(&symbols)?,
            symbol_catalog: symbols,
            parallel: false,
        })
    }

    /// Request per-post extraction on the rayon pool. Without the `parallel`
    /// feature the flag is accepted and ignored.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub fn symbol_catalog(&self) -> &SymbolCatalog {
        &self.symbol_catalog
    }

    #[must_use]
    pub fn theme_catalog(&self) -> &ThemeCatalog {
        &self.theme_catalog
    }

    #[must_use]
    pub fn build(&self, store: &PostStore) -> IndexBundle {
        self.build_with_report(store).0
    }

    #[must_use]
    pub fn build_with_report(&self, store: &PostStore) -> (IndexBundle, BuildReport) {
        let start = Instant::now();
        let contributions = self.contributions(store.as_slice());

        let mut report = BuildReport {
            posts: store.len(),
            ..BuildReport::default()
        };
        for post in store {
            if post.post_number.is_none() {
                report.skipped_missing_id += 1;
                continue;
            }
            if post.timestamp.is_none() {
                report.missing_timestamp += 1;
            }
            if !post.has_text() {
                report.blank_text += 1;
            }
        }

        let mut bundle = IndexBundle {
            fingerprint: self.fingerprint(store),
            symbol_catalog: self.symbol_catalog.as_map().clone(),
            ..IndexBundle::default()
        };
        for contribution in contributions.into_iter().flatten() {
            report.indexed += 1;
            merge(&mut bundle, contribution);
        }

        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        let stats = bundle.stats();
        tracing::info!(
            target = "postindex::build",
            posts = report.posts,
            indexed = report.indexed,
            skipped_missing_id = report.skipped_missing_id,
            missing_timestamp = report.missing_timestamp,
            quote_edges = stats.quote_edges,
            marker_tokens = stats.marker_tokens,
            themes = stats.themes,
            symbol_days = stats.symbol_days,
            duration_ms = report.duration_ms,
            "index build completed"
        );
        (bundle, report)
    }

    /// Reduce one post to what it adds to the bundle. `None` when the post has
    /// no id and therefore belongs in no index.
    #[must_use]
    pub fn contribution(&self, post: &PostRecord) -> Option<PostContribution> {
        let id = post.post_number?;
        let time = post.timestamp.as_ref().map(bucket_keys);
        let date = post.date();
        if !post.has_text() {
            return Some(PostContribution {
                post: id,
                time,
                date,
                ..PostContribution::default()
            });
        }
        let symbols = if date.is_some() {
            self.symbols.scan(&post.text)
        } else {
            SymbolHits::default()
        };
        Some(PostContribution {
            post: id,
            quotes: extract_quotes(&post.text),
            markers: extract_markers(&post.text),
            themes: self.themes.tag(&post.text),
            time,
            date,
            symbols,
        })
    }

    #[cfg(feature = "parallel")]
    fn contributions(&self, posts: &[PostRecord]) -> Vec<Option<PostContribution>> {
        if self.parallel {
            use rayon::prelude::*;
            return posts.par_iter().map(|post| self.contribution(post)).collect();
        }
        posts.iter().map(|post| self.contribution(post)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn contributions(&self, posts: &[PostRecord]) -> Vec<Option<PostContribution>> {
        posts.iter().map(|post| self.contribution(post)).collect()
    }

    /// Digest of the corpus and both catalogs. Two builds with equal
    /// fingerprints produce equal bundles.
    #[must_use]
    pub fn fingerprint(&self, store: &PostStore) -> Fingerprint {
        let mut hasher = Hasher::new();
        hasher.update(FINGERPRINT_DOMAIN);

        hash_len(&mut hasher, store.len());
        for post in store {
            match post.post_number {
                Some(id) => {
                    hasher.update(&[1]);
                    hasher.update(&id.to_le_bytes());
                }
                None => {
                    hasher.update(&[0]);
                }
            }
            match post.timestamp {
                Some(ts) => {
                    hasher.update(&[1]);
                    hasher.update(&ts.timestamp().to_le_bytes());
                    hasher.update(&ts.timestamp_subsec_nanos().to_le_bytes());
                }
                None => {
                    hasher.update(&[0]);
                }
            }
            hash_str(&mut hasher, &post.text);
        }

        hash_len(&mut hasher, self.symbol_catalog.len());
        for (id, entry) in self.symbol_catalog.iter() {
            hash_str(&mut hasher, id);
            hash_len(&mut hasher, entry.aliases.len());
            for alias in &entry.aliases {
                hash_str(&mut hasher, alias);
            }
            hash_str(&mut hasher, &entry.description);
        }

        hash_len(&mut hasher, self.theme_catalog.len());
        for rule in self.theme_catalog.rules() {
            hash_str(&mut hasher, &rule.name);
            hasher.update(&[match rule.match_mode {
                MatchMode::WholeWord => 0,
                MatchMode::Substring => 1,
            }]);
            hash_len(&mut hasher, rule.keywords.len());
            for keyword in &rule.keywords {
                hash_str(&mut hasher, keyword);
            }
        }

        *hasher.finalize().as_bytes()
    }
}

fn hash_len(hasher: &mut Hasher, len: usize) {
    hasher.update(&(len as u64).to_le_bytes());
}

fn hash_str(hasher: &mut Hasher, value: &str) {
    hash_len(hasher, value.len());
    hasher.update(value.as_bytes());
}

fn merge(bundle: &mut IndexBundle, contribution: PostContribution) {
    let PostContribution {
        post,
        quotes,
        markers,
        themes,
        time,
        date,
        symbols,
    } = contribution;

    for &target in &quotes {
        bundle.quoted_by.entry(target).or_default().push(post);
    }
    if !quotes.is_empty() {
        bundle.quotes_by_post.entry(post).or_default().extend(quotes);
    }

    for token in markers {
        bundle.markers_by_token.entry(token).or_default().push(post);
    }

    if !themes.is_empty() {
        for theme in &themes {
            bundle
                .theme_to_posts
                .entry(theme.clone())
                .or_default()
                .push(post);
        }
        let tags = bundle.themes_by_post.entry(post).or_default();
        for theme in themes {
            if !tags.contains(&theme) {
                tags.push(theme);
            }
        }
    }

    if let Some(TimeBuckets { minute, second }) = time {
        bundle.time_hhmm.entry(minute).or_default().push(post);
        bundle.time_hhmmss.entry(second).or_default().push(post);
    }

    if let Some(date) = date {
        if symbols.any_match {
            *bundle.symbol_daily_total.entry(date).or_default() += 1;
        }
        for (symbol, count) in symbols.per_symbol {
            *bundle
                .per_symbol_daily
                .entry(symbol)
                .or_default()
                .entry(date)
                .or_default() += count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SymbolEntry, ThemeRule};
    use chrono::{TimeZone, Utc};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Option<chrono::DateTime<Utc>> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single()
    }

    fn builder() -> IndexBuilder {
        let themes = ThemeCatalog::new(vec![
            ThemeRule::new("Darkness", ["dark"]),
            ThemeRule::new("Space", ["orbit"]),
        ]);
        let symbols = SymbolCatalog::new()
            .with_symbol("XYZ", SymbolEntry::new(["xyz", "ex-why-zee"], "Example"));
        IndexBuilder::new(&themes, symbols).expect("builder")
    }

    #[test]
    fn quotes_and_reverse_edges_stay_symmetric() {
        let store = PostStore::new(vec![
            PostRecord::new(Some(1), at(2018, 1, 5, 3, 7, 22), ">>100 and >>100 again, also >>200"),
            PostRecord::new(Some(2), None, ">>1"),
        ]);
        let bundle = builder().build(&store);
        assert_eq!(bundle.quotes_of(1), &[100, 100, 200]);
        assert_eq!(bundle.quoted_by_of(100), &[1, 1]);
        assert_eq!(bundle.quoted_by_of(200), &[1]);
        assert_eq!(bundle.quoted_by_of(1), &[2]);
    }

    #[test]
    fn post_without_id_contributes_nothing() {
        let store = PostStore::new(vec![PostRecord::new(
            None,
            at(2020, 1, 1, 0, 0, 0),
            ">>5 [Pain] dark orbit xyz",
        )]);
        let (bundle, report) = builder().build_with_report(&store);
        let fingerprint = bundle.fingerprint;
        let empty = IndexBundle {
            fingerprint,
            symbol_catalog: bundle.symbol_catalog.clone(),
            ..IndexBundle::default()
        };
        assert_eq!(bundle, empty);
        assert_eq!(report.skipped_missing_id, 1);
        assert_eq!(report.indexed, 0);
    }

    #[test]
    fn blank_text_only_reaches_time_buckets() {
        let store = PostStore::new(vec![PostRecord::new(Some(9), at(2020, 1, 1, 12, 30, 5), "  \n ")]);
        let (bundle, report) = builder().build_with_report(&store);
        assert_eq!(bundle.posts_at_time("12:30"), &[9]);
        assert_eq!(bundle.posts_at_time("12:30:05"), &[9]);
        assert!(bundle.quotes_by_post().is_empty());
        assert!(bundle.markers_by_token().is_empty());
        assert!(bundle.theme_to_posts().is_empty());
        assert!(bundle.symbol_daily_total().is_empty());
        assert_eq!(report.blank_text, 1);
    }

    #[test]
    fn missing_timestamp_skips_time_and_symbol_timelines_only() {
        let store = PostStore::new(vec![PostRecord::new(Some(3), None, "[Pain] dark xyz >>1")]);
        let (bundle, report) = builder().build_with_report(&store);
        assert!(bundle.time_hhmm().is_empty());
        assert!(bundle.symbol_daily_total().is_empty());
        assert!(bundle.per_symbol_daily("XYZ").is_empty());
        assert_eq!(bundle.posts_with_marker("Pain"), &[3]);
        assert_eq!(bundle.posts_with_theme("Darkness"), &[3]);
        assert_eq!(bundle.quotes_of(3), &[1]);
        assert_eq!(report.missing_timestamp, 1);
    }

    #[test]
    fn aggregate_counts_posts_while_per_symbol_counts_occurrences() {
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).expect("date");
        let store = PostStore::new(vec![
            PostRecord::new(Some(1), at(2020, 1, 1, 8, 0, 0), "xyz xyz ex-why-zee"),
            PostRecord::new(Some(2), at(2020, 1, 1, 9, 0, 0), "XYZ"),
            PostRecord::new(Some(3), at(2020, 1, 1, 10, 0, 0), "nothing here"),
        ]);
        let bundle = builder().build(&store);
        assert_eq!(bundle.symbol_daily_total().get(&day), Some(&2));
        assert_eq!(bundle.per_symbol_daily("XYZ").get(&day), Some(&4));
    }

    #[test]
    fn themes_are_recorded_on_both_sides() {
        let store = PostStore::new(vec![
            PostRecord::new(Some(1), None, "Dark orbit"),
            PostRecord::new(Some(2), None, "darkroom"),
        ]);
        let bundle = builder().build(&store);
        assert_eq!(bundle.posts_with_theme("Darkness"), &[1]);
        assert_eq!(bundle.posts_with_theme("Space"), &[1]);
        assert_eq!(
            bundle.themes_of(1),
            &["Darkness".to_string(), "Space".to_string()]
        );
        assert!(bundle.themes_of(2).is_empty());
    }

    #[test]
    fn fingerprint_tracks_corpus_and_catalog_changes() {
        let store = PostStore::new(vec![PostRecord::new(Some(1), None, "xyz")]);
        let edited = PostStore::new(vec![PostRecord::new(Some(1), None, "xyz!")]);
        let base = builder();
        assert_eq!(base.fingerprint(&store), base.fingerprint(&store));
        assert_ne!(base.fingerprint(&store), base.fingerprint(&edited));

        let other_catalog = IndexBuilder::new(base.theme_catalog(), SymbolCatalog::new())
            .expect("builder");
        assert_ne!(base.fingerprint(&store), other_catalog.fingerprint(&store));
    }

    #[test]
    fn parallel_and_serial_builds_agree() {
        let posts: Vec<PostRecord> = (0..500u64)
            .map(|i| {
                PostRecord::new(
                    Some(i),
                    at(2019, 6, 1 + (i % 28) as u32, (i % 24) as u32, (i % 60) as u32, 0),
                    format!(">>{} [M{}] dark xyz {}", i / 2, i % 7, i),
                )
            })
            .collect();
        let store = PostStore::new(posts);
        let serial = builder().with_parallel(false).build(&store);
        let parallel = builder().with_parallel(true).build(&store);
        assert_eq!(serial, parallel);
    }
}
