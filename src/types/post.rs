//! Normalized post records and the ordered store the indexer iterates.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a post inside the archive. Unique, not necessarily contiguous.
pub type PostId = u64;

/// Image attached to a post or to a quoted reference. Presentation only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    #[serde(default, deserialize_with = "lenient_opt_text")]
    pub file: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_text")]
    pub name: Option<String>,
}

/// Stub of a quoted post carried alongside the body. The indexer ignores it and
/// re-derives quote edges from the body text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReference {
    #[serde(default, deserialize_with = "lenient_post_number")]
    pub post_number: Option<PostId>,
    #[serde(default, deserialize_with = "lenient_opt_text")]
    pub author_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_text")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub images: Vec<ImageAttachment>,
}

/// One archived post as produced by the loader.
///
/// Every field tolerates malformed input: an unusable id or timestamp becomes
/// `None`, a non-string body becomes empty, a list that is not a list of
/// well-formed entries becomes empty. The indexer decides per index what a
/// missing field excludes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(default, deserialize_with = "lenient_post_number")]
    pub post_number: Option<PostId>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_opt_text")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_text")]
    pub author_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub images: Vec<ImageAttachment>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub references: Vec<PostReference>,
}

impl PostRecord {
    /// Minimal record with an id, a timestamp and a body.
    #[must_use]
    pub fn new(
        post_number: Option<PostId>,
        timestamp: Option<DateTime<Utc>>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            post_number,
            timestamp,
            text: text.into(),
            ..Self::default()
        }
    }

    /// `true` when the body carries something other than whitespace.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// UTC calendar date of the post, if it has a timestamp.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.timestamp.map(|ts| ts.date_naive())
    }
}

/// Ordered, read-only collection of posts with an id lookup built once.
#[derive(Debug, Clone, Default)]
pub struct PostStore {
    posts: Vec<PostRecord>,
    positions: HashMap<PostId, usize>,
}

impl PostStore {
    #[must_use]
    pub fn new(posts: Vec<PostRecord>) -> Self {
        let mut positions = HashMap::with_capacity(posts.len());
        for (idx, post) in posts.iter().enumerate() {
            if let Some(id) = post.post_number {
                // First occurrence wins so lookups stay stable for duplicated ids.
                positions.entry(id).or_insert(idx);
            }
        }
        Self { posts, positions }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PostRecord> {
        self.posts.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[PostRecord] {
        &self.posts
    }

    #[must_use]
    pub fn get(&self, id: PostId) -> Option<&PostRecord> {
        self.positions.get(&id).and_then(|&idx| self.posts.get(idx))
    }

    #[must_use]
    pub fn contains(&self, id: PostId) -> bool {
        self.positions.contains_key(&id)
    }
}

impl From<Vec<PostRecord>> for PostStore {
    fn from(posts: Vec<PostRecord>) -> Self {
        Self::new(posts)
    }
}

impl<'a> IntoIterator for &'a PostStore {
    type Item = &'a PostRecord;
    type IntoIter = std::slice::Iter<'a, PostRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.posts.iter()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Unsigned(u64),
    Text(String),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Seconds(i64),
    Fractional(f64),
    Text(String),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawText {
    Text(String),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawList<T> {
    Items(Vec<T>),
    Other(IgnoredAny),
}

fn lenient_post_number<'de, D>(deserializer: D) -> Result<Option<PostId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawNumber::Unsigned(value)) => Some(value),
        Some(RawNumber::Text(text)) => text.trim().parse().ok(),
        Some(RawNumber::Other(_)) | None => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawTimestamp::Seconds(secs)) => Utc.timestamp_opt(secs, 0).single(),
        Some(RawTimestamp::Fractional(secs)) if secs.is_finite() => fractional_timestamp(secs),
        Some(RawTimestamp::Text(text)) => parse_timestamp_text(&text),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_text(deserializer)?.unwrap_or_default())
}

fn lenient_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawText>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawText::Text(text)) => Some(text),
        Some(RawText::Other(_)) | None => None,
    })
}

// One bad entry empties the whole list; these lists are presentation only.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let raw = Option::<RawList<T>>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawList::Items(items)) => items,
        Some(RawList::Other(_)) | None => Vec::new(),
    })
}

/// Whole seconds are floored so pre-epoch values land in the right second.
fn fractional_timestamp(secs: f64) -> Option<DateTime<Utc>> {
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    Utc.timestamp_opt(whole as i64, nanos.min(999_999_999)).single()
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Accepts RFC 3339, an offset-less date-time (read as UTC) or a bare run of
/// Unix seconds.
pub(crate) fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
    {
        return Some(naive.and_utc());
    }
    trimmed
        .parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}
