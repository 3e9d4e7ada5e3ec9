//! Error types for the s3fifo-kv library.
//!
//! ## Key Components
//!
//! - [`StoreError`]: failures reported by a queue backend (open, read,
//!   write, delete).
//! - [`CacheError`]: everything a cache operation can surface to a caller,
//!   including configuration rejection at construction time.
//!
//! An ordinary miss is **not** an error: [`Cache::get`] returns
//! `Ok(None)` for a key that is in no queue.
//!
//! [`Cache::get`]: crate::cache::Cache::get
//!
//! ## Example Usage
//!
//! ```
//! use s3fifo_kv::error::CacheError;
//! use s3fifo_kv::config::CacheConfig;
//!
//! // Invalid ratios are caught at construction, not at first use.
//! let mut config = CacheConfig::new("/tmp/unused", 1 << 20);
//! config.small_ratio = 1.5;
//! let err = config.validate().unwrap_err();
//! assert!(matches!(err, CacheError::Config(_)));
//! ```

use thiserror::Error;

/// Error reported by a queue backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem-level failure while opening or using the backend.
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by the underlying storage engine.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Wraps an engine-specific error message.
    #[inline]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

#[cfg(feature = "rocksdb")]
impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Backend(err.into_string())
    }
}

/// Error surfaced by cache operations.
///
/// Construction rejects bad configuration up front; after that, the only
/// failures a caller sees come from the queue backends. Internal promotion
/// and demotion failures are logged and recovered without failing the
/// user-facing call.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Configuration parameter out of range (zero size, bad ratio).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Directory bootstrap under the base path failed.
    #[error("cache directory error: {0}")]
    Io(#[from] std::io::Error),

    /// A queue backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CacheError {
    /// Creates a configuration error with the given description.
    #[inline]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CacheError>;
