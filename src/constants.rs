//! Fixed values shared by the cache codec and the default options.

/// Leading bytes of every cache artifact.
pub const CACHE_MAGIC: [u8; 8] = *b"PIDXBNDL";

/// BLAKE3 checksum width stored after the magic.
pub const CACHE_CHECKSUM_LEN: usize = 32;

/// Envelope prefix: magic followed by the payload checksum.
pub const CACHE_HEADER_LEN: usize = CACHE_MAGIC.len() + CACHE_CHECKSUM_LEN;

/// Upper bound on a cache artifact we are willing to read into memory.
pub const DEFAULT_MAX_CACHE_BYTES: u64 = 512 * 1024 * 1024;

/// Default file name used when a host only provides a cache directory.
pub const DEFAULT_CACHE_FILE_NAME: &str = "post_index.bin";
