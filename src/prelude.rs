//! Convenience re-exports for typical usage.

pub use crate::builder::CacheBuilder;
pub use crate::cache::{Cache, MemoryCache};
pub use crate::config::CacheConfig;
pub use crate::error::{CacheError, Result, StoreError};
pub use crate::policy::{QueueKind, S3FifoPolicy};
pub use crate::stats::CacheStats;
pub use crate::store::{FifoStore, MemStore};

#[cfg(feature = "rocksdb")]
pub use crate::cache::PersistentCache;
#[cfg(feature = "rocksdb")]
pub use crate::store::RocksStore;
