//! Index orchestration: build or restore a bundle and publish it to readers.
//!
//! [`PostIndex`] is the handle hosts keep for the life of the process. It moves
//! through `Empty → Building → Ready`, and back to `Building` only on an
//! explicit rebuild. Readers call [`PostIndex::snapshot`] and keep the `Arc`
//! they get; a rebuild swaps in a new bundle only once it is complete, so a
//! reader never sees a mix of old and new maps.

mod builder;

use std::sync::{Arc, Mutex, PoisonError, RwLock};

pub use builder::{BuildReport, IndexBuilder, PostContribution};

use crate::error::{IndexError, Result};
use crate::io::cache::{CacheLoad, CacheMiss, IndexCache};
use crate::types::{IndexBundle, IndexOptions, PostStore, SymbolCatalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Empty,
    Building,
    Ready,
}

/// Where the currently published bundle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleSource {
    Cache,
    Rebuilt(BuildReport),
}

pub struct PostIndex {
    options: IndexOptions,
    builder: IndexBuilder,
    cache: Option<IndexCache>,
    state: RwLock<IndexState>,
    current: RwLock<Option<Arc<IndexBundle>>>,
    last_source: RwLock<Option<BundleSource>>,
    // Serializes builds: a reload requested mid-build waits for the in-flight one.
    build_lock: Mutex<()>,
}

impl PostIndex {
    /// Validate options and compile the theme and symbol patterns.
    pub fn new(options: IndexOptions, symbols: SymbolCatalog) -> Result<Self> {
        options.validate()?;
        let builder = IndexBuilder::new(&options.themes, symbols)?.with_parallel(options.parallel);
        let cache = options
            .cache_path
            .as_ref()
            .map(|path| IndexCache::new(path).with_max_bytes(options.max_cache_bytes));
        Ok(Self {
            options,
            builder,
            cache,
            state: RwLock::new(IndexState::Empty),
            current: RwLock::new(None),
            last_source: RwLock::new(None),
            build_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    #[must_use]
    pub fn builder(&self) -> &IndexBuilder {
        &self.builder
    }

    #[must_use]
    pub fn cache(&self) -> Option<&IndexCache> {
        self.cache.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> IndexState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// The published bundle, if any. Stays valid across later rebuilds.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<IndexBundle>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last_source(&self) -> Option<BundleSource> {
        *self.last_source.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restore the bundle from cache when it was built from exactly this corpus
    /// and catalog set; otherwise rebuild and write the result back. Always
    /// ends with a published bundle.
    pub fn load_or_build(&self, store: &PostStore) -> Arc<IndexBundle> {
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.set_state(IndexState::Building);

        if let Some(cache) = &self.cache {
            match cache.load() {
                CacheLoad::Valid(bundle) if bundle.fingerprint() == &self.builder.fingerprint(store) => {
                    tracing::info!(
                        target = "postindex::cache",
                        path = %cache.path().display(),
                        posts = store.len(),
                        "index restored from cache"
                    );
                    return self.publish(bundle, BundleSource::Cache);
                }
                CacheLoad::Valid(_) => {
                    tracing::info!(
                        target = "postindex::cache",
                        path = %cache.path().display(),
                        reason = %CacheMiss::Stale,
                        "index cache miss"
                    );
                }
                CacheLoad::Miss(_) => {}
            }
        }

        self.build_and_publish(store)
    }

    /// Build a brand-new bundle from `store` and swap it in. The previous bundle
    /// stays visible until the swap.
    pub fn rebuild(&self, store: &PostStore) -> Arc<IndexBundle> {
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.set_state(IndexState::Building);
        self.build_and_publish(store)
    }

    /// Write the published bundle to the configured cache.
    pub fn persist(&self) -> Result<()> {
        let cache = self.cache.as_ref().ok_or(IndexError::CacheNotConfigured)?;
        let bundle = self.snapshot().ok_or(IndexError::NotReady)?;
        cache.save(&bundle)
    }

    /// Remove the cache artifact so the next `load_or_build` rebuilds.
    pub fn clear_cache(&self) -> Result<()> {
        match &self.cache {
            Some(cache) => cache.clear(),
            None => Ok(()),
        }
    }

    fn build_and_publish(&self, store: &PostStore) -> Arc<IndexBundle> {
        let (bundle, report) = self.builder.build_with_report(store);
        let published = self.publish(bundle, BundleSource::Rebuilt(report));
        if self.options.write_through {
            self.write_through(&published);
        }
        published
    }

    fn write_through(&self, bundle: &IndexBundle) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(err) = cache.save(bundle) {
            tracing::warn!(
                target = "postindex::cache",
                path = %cache.path().display(),
                error = %err,
                "index cache write failed; continuing with in-memory bundle"
            );
        }
    }

    fn publish(&self, bundle: IndexBundle, source: BundleSource) -> Arc<IndexBundle> {
        let bundle = Arc::new(bundle);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&bundle));
        *self.last_source.write().unwrap_or_else(PoisonError::into_inner) = Some(source);
        self.set_state(IndexState::Ready);
        bundle
    }

    fn set_state(&self, state: IndexState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

impl std::fmt::Debug for PostIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostIndex")
            .field("state", &self.state())
            .field("cache", &self.cache)
            .field("ready", &self.snapshot().is_some())
            .finish_non_exhaustive()
    }
}
