//! Builder-style options controlling index builds and cache persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::theme::ThemeCatalog;
use crate::constants::{DEFAULT_CACHE_FILE_NAME, DEFAULT_MAX_CACHE_BYTES};
use crate::error::{IndexError, Result};

fn default_true() -> bool {
    true
}

fn default_max_cache_bytes() -> u64 {
    DEFAULT_MAX_CACHE_BYTES
}

/// Tunable options for [`crate::PostIndex`].
///
/// Every field has a serde default so hosts can keep a partial JSON file next to
/// the corpus and override only what they need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Location of the binary cache artifact. `None` disables caching.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
    /// Persist a freshly rebuilt bundle to `cache_path` right away.
    #[serde(default = "default_true")]
    pub write_through: bool,
    /// Run per-post extraction on the rayon pool (needs the `parallel` feature).
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Cache artifacts larger than this are ignored on load and refused on save.
    #[serde(default = "default_max_cache_bytes")]
    pub max_cache_bytes: u64,
    #[serde(default)]
    pub themes: ThemeCatalog,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            cache_path: None,
            write_through: true,
            parallel: true,
            max_cache_bytes: default_max_cache_bytes(),
            themes: ThemeCatalog::default(),
        }
    }
}

impl IndexOptions {
    /// Start a fluent builder for `IndexOptions`.
    #[must_use]
    pub fn builder() -> IndexOptionsBuilder {
        IndexOptionsBuilder::default()
    }

    /// Read options from a JSON file and validate them.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs_err::read(path.as_ref())?;
        let options: Self = serde_json::from_slice(&bytes)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_cache_bytes == 0 {
            return Err(IndexError::InvalidOptions {
                reason: "max_cache_bytes must be non-zero",
            });
        }
        if let Some(path) = &self.cache_path {
            if path.as_os_str().is_empty() {
                return Err(IndexError::InvalidOptions {
                    reason: "cache_path must not be empty",
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexOptionsBuilder {
    inner: IndexOptions,
}

impl IndexOptionsBuilder {
    pub fn cache_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.inner.cache_path = Some(path.into());
        self
    }

    /// Cache inside `dir` under the default file name.
    pub fn cache_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.inner.cache_path = Some(dir.as_ref().join(DEFAULT_CACHE_FILE_NAME));
        self
    }

    #[must_use]
    pub fn write_through(mut self, enabled: bool) -> Self {
        self.inner.write_through = enabled;
        self
    }

    #[must_use]
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.inner.parallel = enabled;
        self
    }

    #[must_use]
    pub fn max_cache_bytes(mut self, limit: u64) -> Self {
        self.inner.max_cache_bytes = limit;
        self
    }

    #[must_use]
    pub fn themes(mut self, themes: ThemeCatalog) -> Self {
        self.inner.themes = themes;
        self
    }

    #[must_use]
    pub fn build(self) -> IndexOptions {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::theme::ThemeRule;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let options: IndexOptions =
            serde_json::from_str(r#"{"cache_path": "/tmp/idx.bin", "parallel": false}"#)
                .expect("parse");
        assert_eq!(options.cache_path, Some(PathBuf::from("/tmp/idx.bin")));
        assert!(!options.parallel);
        assert!(options.write_through);
        assert_eq!(options.max_cache_bytes, DEFAULT_MAX_CACHE_BYTES);
        assert_eq!(options.themes, ThemeCatalog::default());
    }

    #[test]
    fn builder_sets_fields() {
        let themes = ThemeCatalog::new(vec![ThemeRule::new("Space", ["orbit"])]);
        let options = IndexOptions::builder()
            .cache_path("cache.bin")
            .write_through(false)
            .max_cache_bytes(1024)
            .themes(themes.clone())
            .build();
        assert_eq!(options.cache_path, Some(PathBuf::from("cache.bin")));
        assert!(!options.write_through);
        assert_eq!(options.max_cache_bytes, 1024);
        assert_eq!(options.themes, themes);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn cache_dir_uses_default_file_name() {
        let options = IndexOptions::builder().cache_dir("state").build();
        assert_eq!(
            options.cache_path,
            Some(PathBuf::from("state").join(DEFAULT_CACHE_FILE_NAME))
        );
    }

    #[test]
    fn zero_cache_limit_is_rejected() {
        let options = IndexOptions::builder().max_cache_bytes(0).build();
        assert!(matches!(
            options.validate(),
            Err(IndexError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn options_load_from_json_file() {
        let dir = tempfile::tempdir().expect("tmp");
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"write_through": false}"#).expect("write");
        let options = IndexOptions::from_json_file(&path).expect("load");
        assert!(!options.write_through);
        assert!(options.cache_path.is_none());
    }
}
