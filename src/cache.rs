//! User-facing cache handle.
//!
//! [`Cache`] wires the policy engine to a concrete backend: it validates
//! the configuration, bootstraps the `small/`, `main/`, and `ghost/`
//! directories under the base path, opens one queue store in each, and
//! keeps the hit/miss counters that back [`stats`](Cache::stats).
//!
//! `get` and `put` are safe to call from many threads at once; the
//! backends serialize their own state and the access tracker takes its
//! own lock.
//!
//! ## Example
//!
//! ```
//! use s3fifo_kv::cache::MemoryCache;
//! use s3fifo_kv::config::CacheConfig;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let cache = MemoryCache::open(CacheConfig::new(dir.path(), 64 << 20)).unwrap();
//!
//! cache.put(b"user:42", b"profile bytes").unwrap();
//! assert_eq!(
//!     cache.get(b"user:42").unwrap().as_deref(),
//!     Some(&b"profile bytes"[..])
//! );
//! assert_eq!(cache.get(b"user:43").unwrap(), None);
//!
//! let stats = cache.stats().unwrap();
//! assert_eq!(stats.hits, 1);
//! assert_eq!(stats.misses, 1);
//! ```

use std::fs;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

use crate::config::CacheConfig;
use crate::error::Result;
use crate::policy::S3FifoPolicy;
use crate::stats::CacheStats;
use crate::store::FifoStore;
use crate::store::MemStore;

/// Names of the per-queue subdirectories created under the base path.
const QUEUE_DIRS: [&str; 3] = ["small", "main", "ghost"];

/// A scan-resistant cache over three FIFO queue stores.
pub struct Cache<S: FifoStore> {
    policy: S3FifoPolicy<S>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Cache with in-memory queues; the base path holds only the (empty)
/// directory skeleton.
pub type MemoryCache = Cache<MemStore>;

/// Cache persisting each queue in a RocksDB instance.
#[cfg(feature = "rocksdb")]
pub type PersistentCache = Cache<crate::store::RocksStore>;

impl<S: FifoStore> Cache<S> {
    /// Validates `config`, creates the queue directories, and opens the
    /// three backends.
    ///
    /// Fails on invalid configuration, on directory creation, or on any
    /// backend refusing to open. Existing backend contents are adopted
    /// as-is; the access tracker always starts empty.
    pub fn open(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        fs::create_dir_all(&config.base_path)?;
        for sub in QUEUE_DIRS {
            fs::create_dir_all(config.base_path.join(sub))?;
        }

        info!(
            base = %config.base_path.display(),
            total_bytes = config.total_bytes,
            small_bytes = config.small_bytes(),
            main_bytes = config.main_bytes(),
            ghost_bytes = config.ghost_bytes(),
            "opening s3-fifo cache"
        );

        Ok(Self {
            policy: S3FifoPolicy::open(&config)?,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Looks up `key`. `Ok(None)` is an ordinary miss and inserts
    /// nothing.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let found = self.policy.get(key)?;
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        Ok(found)
    }

    /// Inserts or updates `key`, evicting as needed to stay within
    /// budget.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.policy.put(key, value)
    }

    /// Runs a quick-demotion pass over the small queue; see
    /// [`S3FifoPolicy::sweep`].
    pub fn sweep(&self) -> Result<usize> {
        self.policy.sweep()
    }

    /// Current occupancy and request counters.
    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = self.policy.snapshot()?;
        stats.hits = self.hits.load(Ordering::Relaxed);
        stats.misses = self.misses.load(Ordering::Relaxed);
        Ok(stats)
    }

    /// Prints a human-readable snapshot to stdout. Intended for
    /// interactive inspection; the format is not stable.
    pub fn print_state(&self) -> Result<()> {
        let stats = self.stats()?;
        println!("cache state:");
        println!("  small: {} items / {} bytes", stats.small_items, stats.small_bytes);
        println!("  main:  {} items / {} bytes", stats.main_items, stats.main_bytes);
        println!("  ghost: {} items / {} bytes", stats.ghost_items, stats.ghost_bytes);
        println!(
            "  requests: {} hits, {} misses ({:.2}% hit ratio)",
            stats.hits,
            stats.misses,
            stats.hit_ratio() * 100.0
        );
        println!("  tracked keys: {}", self.policy.tracker().len());
        debug!(%stats, "state snapshot");
        Ok(())
    }

    /// The underlying policy engine, for queue-residency inspection.
    #[inline]
    pub fn policy(&self) -> &S3FifoPolicy<S> {
        &self.policy
    }
}
