//! Cache configuration and derived queue budgets.
//!
//! A [`CacheConfig`] carries everything the cache needs at construction
//! time: the base directory, the total byte budget, the queue split
//! ratios, and the policy tunables. Validation happens once, up front;
//! a config that passes [`CacheConfig::validate`] yields a usable cache.
//!
//! ## Budget derivation
//!
//! ```text
//!   total_bytes ──┬── small  = total * small_ratio          (hot candidates)
//!                 ├── main   = total * (1 - small_ratio)    (primary store)
//!                 └── ghost  = total * ghost_ratio          (keys only)
//! ```
//!
//! Ghost entries are metadata and do not count against user-visible
//! capacity, so `small + main = total` while `ghost` is budgeted on top.
//!
//! ## Example
//!
//! ```
//! use s3fifo_kv::config::CacheConfig;
//!
//! let config = CacheConfig::new("/var/cache/pages", 64 << 20);
//! assert_eq!(config.small_ratio, 0.1);
//! assert_eq!(config.small_bytes() + config.main_bytes(), 64 << 20);
//! config.validate().unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::{CacheError, Result};

/// Default fraction of the total budget given to the small queue.
pub const DEFAULT_SMALL_RATIO: f64 = 0.1;

/// Default fraction of the total budget given to the ghost queue.
pub const DEFAULT_GHOST_RATIO: f64 = 0.1;

/// Default per-entry size estimate used for budget checks, in bytes.
pub const DEFAULT_AVG_ENTRY_SIZE: u64 = 4096;

/// Default probability that a repeat hit in the main queue promotes.
pub const DEFAULT_PROMOTION_PROBABILITY: f64 = 0.01;

/// Accesses required before the probabilistic promotion path applies.
pub const DEFAULT_MIN_ACCESS_COUNT: u32 = 2;

/// Idle logical ticks after which a small-queue resident is demoted.
pub const DEFAULT_AGE_THRESHOLD: u64 = 10_000;

/// Construction-time parameters for a cache instance.
///
/// Fields are public; adjust them directly or go through
/// [`CacheBuilder`](crate::builder::CacheBuilder) for a fluent API.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory under which the `small/`, `main/`, and `ghost/`
    /// sub-stores are created.
    pub base_path: PathBuf,

    /// Total cache budget in bytes. Must be positive.
    pub total_bytes: u64,

    /// Fraction of `total_bytes` for the small queue, in `(0, 1)`.
    pub small_ratio: f64,

    /// Fraction of `total_bytes` for the ghost queue, in `(0, 1]`.
    pub ghost_ratio: f64,

    /// Per-entry size estimate for budget checks. Queue occupancy is
    /// approximated as `items * avg_entry_size`.
    pub avg_entry_size: u64,

    /// Probability in `[0, 1]` that a qualifying main-queue hit promotes
    /// the key into the small queue. Ghost hits bypass this entirely.
    pub promotion_probability: f64,

    /// Number of recorded accesses a key needs before the probabilistic
    /// promotion path considers it. The first hit never promotes.
    pub min_access_count: u32,

    /// Idle logical ticks after which a small-queue resident is
    /// considered cold and demoted to the main queue.
    pub age_threshold: u64,

    /// Seed for the promotion draw. `None` seeds from the OS; tests pin
    /// this for reproducibility.
    pub rng_seed: Option<u64>,
}

impl CacheConfig {
    /// Creates a config with default ratios and tunables.
    ///
    /// # Example
    ///
    /// ```
    /// use s3fifo_kv::config::CacheConfig;
    ///
    /// let config = CacheConfig::new("/tmp/cache", 10 << 20);
    /// assert_eq!(config.total_bytes, 10 << 20);
    /// assert_eq!(config.ghost_ratio, 0.1);
    /// ```
    pub fn new(base_path: impl AsRef<Path>, total_bytes: u64) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            total_bytes,
            small_ratio: DEFAULT_SMALL_RATIO,
            ghost_ratio: DEFAULT_GHOST_RATIO,
            avg_entry_size: DEFAULT_AVG_ENTRY_SIZE,
            promotion_probability: DEFAULT_PROMOTION_PROBABILITY,
            min_access_count: DEFAULT_MIN_ACCESS_COUNT,
            age_threshold: DEFAULT_AGE_THRESHOLD,
            rng_seed: None,
        }
    }

    /// Byte budget of the small queue.
    #[inline]
    pub fn small_bytes(&self) -> u64 {
        (self.total_bytes as f64 * self.small_ratio) as u64
    }

    /// Byte budget of the main queue.
    #[inline]
    pub fn main_bytes(&self) -> u64 {
        self.total_bytes - self.small_bytes()
    }

    /// Byte budget of the ghost queue.
    #[inline]
    pub fn ghost_bytes(&self) -> u64 {
        (self.total_bytes as f64 * self.ghost_ratio) as u64
    }

    /// Checks every parameter, returning the first violation found.
    ///
    /// # Example
    ///
    /// ```
    /// use s3fifo_kv::config::CacheConfig;
    ///
    /// let mut config = CacheConfig::new("/tmp/cache", 1 << 20);
    /// config.ghost_ratio = 0.0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.total_bytes == 0 {
            return Err(CacheError::config("total_bytes must be positive"));
        }
        if !self.small_ratio.is_finite() || self.small_ratio <= 0.0 || self.small_ratio >= 1.0 {
            return Err(CacheError::config(format!(
                "small_ratio must be in (0, 1), got {}",
                self.small_ratio
            )));
        }
        if !self.ghost_ratio.is_finite() || self.ghost_ratio <= 0.0 || self.ghost_ratio > 1.0 {
            return Err(CacheError::config(format!(
                "ghost_ratio must be in (0, 1], got {}",
                self.ghost_ratio
            )));
        }
        if !self.promotion_probability.is_finite()
            || !(0.0..=1.0).contains(&self.promotion_probability)
        {
            return Err(CacheError::config(format!(
                "promotion_probability must be in [0, 1], got {}",
                self.promotion_probability
            )));
        }
        if self.avg_entry_size == 0 {
            return Err(CacheError::config("avg_entry_size must be positive"));
        }
        if self.base_path.as_os_str().is_empty() {
            return Err(CacheError::config("base_path must not be empty"));
        }
        Ok(())
    }
}
