//! Persistence: corpus/catalog loading and the bundle cache.

pub mod cache;
pub mod loader;
