//! Error type shared by loaders, catalog compilation and cache persistence.
//!
//! Cache *loading* never produces an error (see [`crate::io::cache::CacheLoad`]);
//! only operations whose failure the host must act on return [`IndexError`].

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode index bundle: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to compile pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid catalog: {reason}")]
    InvalidCatalog { reason: String },

    #[error("invalid options: {reason}")]
    InvalidOptions { reason: &'static str },

    #[error("no cache path configured")]
    CacheNotConfigured,

    #[error("index has not been built yet")]
    NotReady,

    #[error("cache artifact {path} exceeds {limit} bytes")]
    CacheTooLarge { path: PathBuf, limit: u64 },
}
