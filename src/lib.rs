#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(
        clippy::useless_vec,
        clippy::uninlined_format_args,
        clippy::field_reassign_with_default
    )
)]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: internal helpers are self-describing; public entry points
// carry their own docs.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Counts and lengths are bounded by corpus size.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
//
#![allow(clippy::needless_pass_by_value)] // Builders take owned values intentionally
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::implicit_hasher)]

//! Precomputed lookup indices over an archived post corpus.
//!
//! A [`PostStore`] is scanned once by [`IndexBuilder`] to produce an
//! [`IndexBundle`]: quote edges in both directions, bracketed markers, theme
//! tags, time-of-day buckets and symbol mention timelines. [`PostIndex`] owns the
//! build, restores bundles from a single-file binary cache when the inputs are
//! unchanged, and publishes each new bundle with one atomic swap.
//!
//! ```no_run
//! use postindex_core::{IndexOptions, PostIndex, io::loader};
//!
//! # fn main() -> postindex_core::Result<()> {
//! let store = loader::load_posts("posts.json")?;
//! let symbols = loader::load_symbol_catalog_or_empty("symbols.json")?;
//! let options = IndexOptions::builder().cache_path("cache/post_index.bin").build();
//!
//! let index = PostIndex::new(options, symbols)?;
//! let bundle = index.load_or_build(&store);
//! for quoting in bundle.quoted_by_of(4_500) {
//!     println!("quoted by {quoting}");
//! }
//! # Ok(())
//! # }
//! ```

/// The postindex-core crate version (matches `Cargo.toml`).
pub const POSTINDEX_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod constants;
pub mod error;
pub mod index;
pub mod io;
pub mod scan;
pub mod types;

pub use constants::*;
pub use error::{IndexError, Result};
pub use index::{BuildReport, BundleSource, IndexBuilder, IndexState, PostContribution, PostIndex};
pub use io::cache::{CacheLoad, CacheMiss, IndexCache};
pub use scan::{
    SymbolHits, SymbolMatcher, ThemeTagger, TimeBuckets, TimeKey, bucket_keys, extract_markers,
    extract_quotes,
};
pub use types::{
    BundleStats, Fingerprint, ImageAttachment, IndexBundle, IndexOptions, IndexOptionsBuilder,
    MatchMode, PostId, PostRecord, PostReference, PostStore, SymbolCatalog, SymbolEntry,
    ThemeCatalog, ThemeRule,
};
