//! JSON loaders for the normalized corpus and the symbol catalog.
//!
//! The corpus file is a JSON array of post records; the catalog is a JSON object
//! keyed by symbol id. Malformed fields inside a record degrade to `None`
//! instead of rejecting the file (see [`PostRecord`]).

use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;

use crate::error::{IndexError, Result};
use crate::types::{PostRecord, PostStore, SymbolCatalog, ThemeCatalog};

pub fn load_posts(path: impl AsRef<Path>) -> Result<PostStore> {
    let path = path.as_ref();
    let start = Instant::now();
    let bytes = fs_err::read(path)?;
    let posts = parse_posts(&bytes)?;
    let missing_ids = posts.iter().filter(|p| p.post_number.is_none()).count();
    let missing_timestamps = posts.iter().filter(|p| p.timestamp.is_none()).count();
    tracing::info!(
        target = "postindex::load",
        path = %path.display(),
        posts = posts.len(),
        missing_ids,
        missing_timestamps,
        duration_ms = start.elapsed().as_millis() as u64,
        "corpus loaded"
    );
    Ok(PostStore::new(posts))
}

/// Decode a JSON array of posts. Elements that are not post objects at all are
/// skipped and counted; the file itself must still be an array.
pub fn parse_posts(bytes: &[u8]) -> Result<Vec<PostRecord>> {
    let raw: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;
    let total = raw.len();
    let posts: Vec<PostRecord> = raw
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    let skipped = total - posts.len();
    if skipped > 0 {
        tracing::warn!(
            target = "postindex::load",
            skipped,
            total,
            "malformed post records skipped"
        );
    }
    Ok(posts)
}

pub fn load_symbol_catalog(path: impl AsRef<Path>) -> Result<SymbolCatalog> {
    let path = path.as_ref();
    let bytes = fs_err::read(path)?;
    let catalog: SymbolCatalog = serde_json::from_slice(&bytes)?;
    if let Some((id, _)) = catalog.iter().find(|(id, _)| id.trim().is_empty()) {
        return Err(IndexError::InvalidCatalog {
            reason: format!("symbol id {id:?} is blank"),
        });
    }
    tracing::info!(
        target = "postindex::load",
        path = %path.display(),
        symbols = catalog.len(),
        "symbol catalog loaded"
    );
    Ok(catalog)
}

/// Like [`load_symbol_catalog`], but a missing file is an empty catalog.
pub fn load_symbol_catalog_or_empty(path: impl AsRef<Path>) -> Result<SymbolCatalog> {
    let path = path.as_ref();
    match load_symbol_catalog(path) {
        Err(IndexError::Io(err)) if err.kind() == ErrorKind::NotFound => {
            tracing::info!(
                target = "postindex::load",
                path = %path.display(),
                "symbol catalog absent; timelines will be empty"
            );
            Ok(SymbolCatalog::new())
        }
        other => other,
    }
}

pub fn load_theme_catalog(path: impl AsRef<Path>) -> Result<ThemeCatalog> {
    let bytes = fs_err::read(path.as_ref())?;
    let catalog: ThemeCatalog = serde_json::from_slice(&bytes)?;
    if let Some(rule) = catalog.rules().iter().find(|r| r.name.trim().is_empty()) {
        return Err(IndexError::InvalidCatalog {
            reason: format!("theme with keywords {:?} has a blank name", rule.keywords),
        });
    }
    Ok(catalog)
}
