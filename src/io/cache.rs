//! Single-file binary cache for an [`IndexBundle`].
//!
//! Layout: `[magic: 8][blake3(payload): 32][payload]`, where the payload is the
//! bundle encoded with bincode's fixed-int little-endian configuration.
//! Loading never fails: anything short of a clean decode is reported as a
//! [`CacheMiss`] and the caller rebuilds from the corpus. There is no format
//! version; a layout change simply stops decoding and falls through to a
//! rebuild.

use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use atomic_write_file::AtomicWriteFile;
use bincode::config::{self, Config};
use bincode::serde::{decode_from_slice, encode_to_vec};

use crate::constants::{CACHE_CHECKSUM_LEN, CACHE_HEADER_LEN, CACHE_MAGIC, DEFAULT_MAX_CACHE_BYTES};
use crate::error::{IndexError, Result};
use crate::types::IndexBundle;

/// Outcome of reading the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLoad {
    Valid(IndexBundle),
    Miss(CacheMiss),
}

impl CacheLoad {
    #[must_use]
    pub fn into_bundle(self) -> Option<IndexBundle> {
        match self {
            Self::Valid(bundle) => Some(bundle),
            Self::Miss(_) => None,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Why a cache read did not produce a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMiss {
    NotFound,
    Unreadable,
    TooLarge { size: u64, limit: u64 },
    Truncated,
    BadMagic,
    ChecksumMismatch,
    Undecodable,
    /// Decoded fine but was built from different inputs.
    Stale,
}

impl fmt::Display for CacheMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::Unreadable => f.write_str("unreadable"),
            Self::TooLarge { size, limit } => write!(f, "too large ({size} > {limit} bytes)"),
            Self::Truncated => f.write_str("truncated"),
            Self::BadMagic => f.write_str("bad magic"),
            Self::ChecksumMismatch => f.write_str("checksum mismatch"),
            Self::Undecodable => f.write_str("undecodable"),
            Self::Stale => f.write_str("stale"),
        }
    }
}

fn cache_config() -> impl Config {
    config::standard()
        .with_fixed_int_encoding()
        .with_little_endian()
}

/// Serialize `bundle` into the on-disk envelope.
pub fn encode_bundle(bundle: &IndexBundle) -> Result<Vec<u8>> {
    let payload = encode_to_vec(bundle, cache_config())?;
    let checksum = blake3::hash(&payload);
    let mut bytes = Vec::with_capacity(CACHE_HEADER_LEN + payload.len());
    bytes.extend_from_slice(&CACHE_MAGIC);
    bytes.extend_from_slice(checksum.as_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Inverse of [`encode_bundle`]; every failure becomes a [`CacheMiss`].
pub fn decode_bundle(bytes: &[u8]) -> std::result::Result<IndexBundle, CacheMiss> {
    if bytes.len() < CACHE_HEADER_LEN {
        return Err(CacheMiss::Truncated);
    }
    let (magic, rest) = bytes.split_at(CACHE_MAGIC.len());
    if magic != CACHE_MAGIC {
        return Err(CacheMiss::BadMagic);
    }
    let (checksum, payload) = rest.split_at(CACHE_CHECKSUM_LEN);
    if blake3::hash(payload).as_bytes() != checksum {
        return Err(CacheMiss::ChecksumMismatch);
    }
    match decode_from_slice::<IndexBundle, _>(payload, cache_config()) {
        Ok((bundle, consumed)) if consumed == payload.len() => Ok(bundle),
        Ok(_) | Err(_) => Err(CacheMiss::Undecodable),
    }
}

/// Cache artifact bound to a path and a size ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCache {
    path: PathBuf,
    max_bytes: u64,
}

impl IndexCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_bytes: DEFAULT_MAX_CACHE_BYTES,
        }
    }

    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `bundle` atomically: readers see either the old artifact or the new
    /// one, never a partial file.
    pub fn save(&self, bundle: &IndexBundle) -> Result<()> {
        let bytes = encode_bundle(bundle)?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(IndexError::CacheTooLarge {
                path: self.path.clone(),
                limit: self.max_bytes,
            });
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }
        let mut file = AtomicWriteFile::open(&self.path)?;
        file.write_all(&bytes)?;
        file.commit()?;
        tracing::debug!(
            target = "postindex::cache",
            path = %self.path.display(),
            bytes = bytes.len(),
            "index cache written"
        );
        Ok(())
    }

    pub fn load(&self) -> CacheLoad {
        match self.read_bytes().and_then(|bytes| decode_bundle(&bytes)) {
            Ok(bundle) => {
                tracing::debug!(
                    target = "postindex::cache",
                    path = %self.path.display(),
                    "index cache restored"
                );
                CacheLoad::Valid(bundle)
            }
            Err(miss) => {
                tracing::info!(
                    target = "postindex::cache",
                    path = %self.path.display(),
                    reason = %miss,
                    "index cache miss"
                );
                CacheLoad::Miss(miss)
            }
        }
    }

    /// Delete the artifact if present.
    pub fn clear(&self) -> Result<()> {
        match fs_err::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn read_bytes(&self) -> std::result::Result<Vec<u8>, CacheMiss> {
        let metadata = match fs_err::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(CacheMiss::NotFound),
            Err(_) => return Err(CacheMiss::Unreadable),
        };
        if metadata.len() > self.max_bytes {
            return Err(CacheMiss::TooLarge {
                size: metadata.len(),
                limit: self.max_bytes,
            });
        }
        fs_err::read(&self.path).map_err(|_| CacheMiss::Unreadable)
    }
}

/// Write `bundle` to `path` with the default size ceiling.
pub fn save(bundle: &IndexBundle, path: impl AsRef<Path>) -> Result<()> {
    IndexCache::new(path.as_ref()).save(bundle)
}

/// Read a bundle from `path`; `None` on any kind of miss.
pub fn load(path: impl AsRef<Path>) -> Option<IndexBundle> {
    IndexCache::new(path.as_ref()).load().into_bundle()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn sample_bundle() -> IndexBundle {
        let mut bundle = IndexBundle::default();
        bundle.fingerprint = [7u8; 32];
        bundle.quotes_by_post.insert(1, vec![100, 100, 200]);
        bundle.quoted_by.insert(100, vec![1, 1]);
        bundle.quoted_by.insert(200, vec![1]);
        bundle.markers_by_token.insert("Pain".into(), vec![1]);
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).expect("date");
        bundle.symbol_daily_total.insert(date, 1);
        bundle
            .per_symbol_daily
            .entry("XYZ".into())
            .or_default()
            .insert(date, 3);
        bundle
    }

    #[test]
    fn save_then_load_restores_every_map() {
        let dir = tempdir().expect("tmp");
        let path = dir.path().join("nested").join("index.bin");
        let bundle = sample_bundle();
        save(&bundle, &path).expect("save");
        assert_eq!(load(&path), Some(bundle));
    }

    #[test]
    fn missing_file_is_a_miss() {
        let dir = tempdir().expect("tmp");
        let cache = IndexCache::new(dir.path().join("absent.bin"));
        assert_eq!(cache.load(), CacheLoad::Miss(CacheMiss::NotFound));
    }

    #[test]
    fn damaged_envelopes_are_classified() {
        let bytes = encode_bundle(&sample_bundle()).expect("encode");

        assert_eq!(decode_bundle(&bytes[..10]), Err(CacheMiss::Truncated));

        let mut bad_magic = bytes.clone();
        bad_magic[0] ^= 0xFF;
        assert_eq!(decode_bundle(&bad_magic), Err(CacheMiss::BadMagic));

        let mut flipped = bytes.clone();
        let last = flipped.len() - 1;
        flipped[last] ^= 0xFF;
        assert_eq!(decode_bundle(&flipped), Err(CacheMiss::ChecksumMismatch));

        let truncated_payload = &bytes[..bytes.len() - 4];
        assert_eq!(
            decode_bundle(truncated_payload),
            Err(CacheMiss::ChecksumMismatch)
        );
    }

    #[test]
    fn foreign_payload_with_valid_checksum_is_undecodable() {
        let payload = b"definitely not a bundle".to_vec();
        let mut bytes = CACHE_MAGIC.to_vec();
        bytes.extend_from_slice(blake3::hash(&payload).as_bytes());
        bytes.extend_from_slice(&payload);
        assert_eq!(decode_bundle(&bytes), Err(CacheMiss::Undecodable));
    }

    #[test]
    fn oversized_artifacts_are_skipped_and_refused() {
        let dir = tempdir().expect("tmp");
        let path = dir.path().join("index.bin");
        let bundle = sample_bundle();
        save(&bundle, &path).expect("save");

        let tiny = IndexCache::new(&path).with_max_bytes(8);
        assert!(matches!(
            tiny.load(),
            CacheLoad::Miss(CacheMiss::TooLarge { limit: 8, .. })
        ));
        assert!(matches!(
            tiny.save(&bundle),
            Err(IndexError::CacheTooLarge { limit: 8, .. })
        ));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempdir().expect("tmp");
        let cache = IndexCache::new(dir.path().join("index.bin"));
        cache.save(&sample_bundle()).expect("save");
        cache.clear().expect("clear");
        cache.clear().expect("clear again");
        assert_eq!(cache.load(), CacheLoad::Miss(CacheMiss::NotFound));
    }
}
