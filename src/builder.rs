//! Fluent construction of cache instances.
//!
//! [`CacheBuilder`] wraps a [`CacheConfig`] with chainable setters and
//! picks the backend at build time: [`build`](CacheBuilder::build) for
//! the in-memory backend, [`build_with`](CacheBuilder::build_with) for
//! any [`FifoStore`], and `build_persistent` for RocksDB-backed queues
//! when the `rocksdb` feature is enabled.
//!
//! ## Example
//!
//! ```
//! use s3fifo_kv::builder::CacheBuilder;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let cache = CacheBuilder::new(dir.path(), 32 << 20)
//!     .small_ratio(0.2)
//!     .promotion_probability(0.05)
//!     .build()
//!     .unwrap();
//!
//! cache.put(b"k", b"v").unwrap();
//! assert!(cache.get(b"k").unwrap().is_some());
//! ```

use std::path::Path;

use crate::cache::{Cache, MemoryCache};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::store::FifoStore;

/// Builder for [`Cache`] instances.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    config: CacheConfig,
}

impl CacheBuilder {
    /// Starts from the default configuration for the given base path and
    /// total byte budget.
    pub fn new(base_path: impl AsRef<Path>, total_bytes: u64) -> Self {
        Self {
            config: CacheConfig::new(base_path, total_bytes),
        }
    }

    /// Fraction of the budget for the small queue, in `(0, 1)`.
    pub fn small_ratio(mut self, ratio: f64) -> Self {
        self.config.small_ratio = ratio;
        self
    }

    /// Fraction of the budget for the ghost queue, in `(0, 1]`.
    pub fn ghost_ratio(mut self, ratio: f64) -> Self {
        self.config.ghost_ratio = ratio;
        self
    }

    /// Per-entry size estimate used by the budget checks.
    pub fn avg_entry_size(mut self, bytes: u64) -> Self {
        self.config.avg_entry_size = bytes;
        self
    }

    /// Probability that a qualifying repeat hit promotes, in `[0, 1]`.
    pub fn promotion_probability(mut self, probability: f64) -> Self {
        self.config.promotion_probability = probability;
        self
    }

    /// Accesses required before the probabilistic promotion applies.
    pub fn min_access_count(mut self, count: u32) -> Self {
        self.config.min_access_count = count;
        self
    }

    /// Idle ticks after which a small-queue resident is demoted.
    pub fn age_threshold(mut self, ticks: u64) -> Self {
        self.config.age_threshold = ticks;
        self
    }

    /// Pins the promotion draw for reproducible runs.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.config.rng_seed = Some(seed);
        self
    }

    /// The configuration assembled so far.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Builds a cache over in-memory queues.
    pub fn build(self) -> Result<MemoryCache> {
        MemoryCache::open(self.config)
    }

    /// Builds a cache over the given backend type.
    pub fn build_with<S: FifoStore>(self) -> Result<Cache<S>> {
        Cache::open(self.config)
    }

    /// Builds a cache persisting each queue in RocksDB.
    #[cfg(feature = "rocksdb")]
    pub fn build_persistent(self) -> Result<crate::cache::PersistentCache> {
        crate::cache::PersistentCache::open(self.config)
    }
}
