//! S3-FIFO admission, promotion, and eviction engine.
//!
//! Three FIFO queues cooperate to deliver scan resistance without LRU
//! bookkeeping: a small queue of hot candidates, a main queue holding the
//! bulk of the data, and a ghost queue remembering the keys (not values)
//! of recent evictions.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                      S3FifoPolicy<S> Layout                        │
//! │                                                                    │
//! │   SMALL (hot candidates)          MAIN (primary store)             │
//! │   ┌──────────────────────┐        ┌──────────────────────┐         │
//! │   │ newest ──────► oldest│        │ newest ──────► oldest│         │
//! │   │            evict here│        │            evict here│         │
//! │   └──────────┬───────────┘        └──────────┬───────────┘         │
//! │              │ oldest, count == 0            │ oldest, not in SMALL│
//! │              ▼                               ▼                     │
//! │   GHOST (keys only) ◄────────────────────────┘                     │
//! │   ┌──────────────────────────────────────────────────────┐         │
//! │   │  re-accessing a ghosted key promotes it immediately  │         │
//! │   └──────────────────────────────────────────────────────┘         │
//! │                                                                    │
//! │   AccessTracker: key -> (count, last_access), logical clock        │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Decision flow
//!
//! ```text
//! get(k):
//!   in SMALL  -> return value; record access;
//!                demote to MAIN if the key had gone idle
//!   in MAIN   -> return value; record access;
//!                ghosted?               -> promote to SMALL (unconditional)
//!                repeat hit, draw < p   -> promote to SMALL (p = 0.01)
//!   otherwise -> miss; nothing is inserted
//!
//! put(k, v):
//!   in SMALL  -> overwrite in place (queue position kept)
//!   otherwise -> insert/overwrite in MAIN; while MAIN over budget,
//!                evict its oldest: keys absent from SMALL are ghosted
//!
//! SMALL overflow (after a promotion or admission):
//!   oldest e: count[e] > 0  -> graduate e into MAIN
//!             count[e] == 0 -> remember e's key in GHOST, drop value
//! ```
//!
//! The slow probabilistic promotion keeps one-off scans from flooding the
//! small queue; the ghost path gives recently evicted keys a second chance
//! without waiting on the dice.
//!
//! ## Properties
//!
//! | Property | Mechanism |
//! |----------|-----------|
//! | Scan resistance | scans never pass the promotion gate, so they churn MAIN only |
//! | Cheap promotion | one counter compare plus one uniform draw per MAIN hit |
//! | Quick demotion | idle keys leave SMALL on access or via [`sweep`](S3FifoPolicy::sweep) |
//! | Bounded metadata | GHOST stores keys only and trims itself FIFO |
//!
//! ## Failure handling
//!
//! Promotion and demotion are best-effort: if a queue move fails midway it
//! is rolled back, the incident is logged, and the caller still receives
//! the value that was found. Only `put` surfaces backend errors directly.
//!
//! ## Example
//!
//! ```
//! use s3fifo_kv::config::CacheConfig;
//! use s3fifo_kv::policy::S3FifoPolicy;
//! use s3fifo_kv::store::MemStore;
//!
//! let mut config = CacheConfig::new("unused", 100 * 4096);
//! config.promotion_probability = 1.0; // deterministic for the example
//!
//! let policy: S3FifoPolicy<MemStore> = S3FifoPolicy::open(&config).unwrap();
//! policy.put(b"page", b"payload").unwrap();
//! assert_eq!(policy.get(b"page").unwrap().as_deref(), Some(&b"payload"[..]));
//! ```

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::error::{Result, StoreError};
use crate::policy::queue::BoundedQueue;
use crate::stats::CacheStats;
use crate::store::FifoStore;
use crate::tracker::AccessTracker;

/// Which value-bearing queue currently holds a key.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum QueueKind {
    /// The small hot-candidate queue.
    Small,
    /// The main queue.
    Main,
}

/// The S3-FIFO decision engine over three queue backends.
///
/// Generic over the backend so tests can run entirely in memory while
/// deployments persist each queue; see [`crate::store`].
pub struct S3FifoPolicy<S: FifoStore> {
    small: BoundedQueue<S>,
    main: BoundedQueue<S>,
    ghost: BoundedQueue<S>,
    tracker: AccessTracker,
    promotion_probability: f64,
    min_access_count: u32,
    age_threshold: u64,
    rng: Mutex<StdRng>,
}

impl<S: FifoStore> S3FifoPolicy<S> {
    /// Validates `config` and opens the three queues under its base path
    /// (`small/`, `main/`, `ghost/`).
    ///
    /// Does not create the base directory itself; backends that need
    /// their own directories create them on open.
    pub fn open(config: &CacheConfig) -> Result<Self> {
        config.validate()?;

        let small = BoundedQueue::open(
            "small",
            &config.base_path.join("small"),
            config.small_bytes(),
            config.avg_entry_size,
        )?;
        let main = BoundedQueue::open(
            "main",
            &config.base_path.join("main"),
            config.main_bytes(),
            config.avg_entry_size,
        )?;
        let ghost = BoundedQueue::open(
            "ghost",
            &config.base_path.join("ghost"),
            config.ghost_bytes(),
            config.avg_entry_size,
        )?;

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            small,
            main,
            ghost,
            tracker: AccessTracker::new(),
            promotion_probability: config.promotion_probability,
            min_access_count: config.min_access_count,
            age_threshold: config.age_threshold,
            rng: Mutex::new(rng),
        })
    }

    /// Looks up `key`, recording the access and applying promotion and
    /// demotion rules. Returns `Ok(None)` on a miss; misses insert
    /// nothing.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(value) = self.small.get(key)? {
            let obs = self.tracker.observe(key);
            debug!(key = %KeyDisplay(key), count = obs.count, "small queue hit");

            // Idle time is measured up to the previous access; the hit we
            // just recorded does not shield a key that had gone cold.
            if obs.idle > self.age_threshold {
                if let Err(err) = self.demote(key, &value) {
                    warn!(key = %KeyDisplay(key), %err, "demotion failed, key stays in small");
                }
            }
            return Ok(Some(value));
        }

        if let Some(value) = self.main.get(key)? {
            let obs = self.tracker.observe(key);
            debug!(key = %KeyDisplay(key), count = obs.count, "main queue hit");

            let ghosted = match self.ghost.contains(key) {
                Ok(hit) => hit,
                Err(err) => {
                    warn!(key = %KeyDisplay(key), %err, "ghost lookup failed");
                    false
                },
            };

            if ghosted || (obs.count >= self.min_access_count && self.roll_promotion()) {
                match self.promote(key, &value, ghosted) {
                    Ok(()) => {
                        debug!(key = %KeyDisplay(key), ghosted, "promoted to small queue")
                    },
                    Err(err) => {
                        warn!(key = %KeyDisplay(key), %err, "promotion failed, key stays in main")
                    },
                }
            }
            return Ok(Some(value));
        }

        // A concurrent promotion can move a key small-ward between our
        // two probes (small insert happens before the main delete); one
        // re-check of the small queue closes that window.
        if let Some(value) = self.small.get(key)? {
            self.tracker.observe(key);
            debug!(key = %KeyDisplay(key), "small queue hit after promotion race");
            return Ok(Some(value));
        }

        debug!(key = %KeyDisplay(key), "miss");
        Ok(None)
    }

    /// Inserts or updates `key`.
    ///
    /// A key resident in the small queue is updated in place (its queue
    /// position is preserved); everything else lands in the main queue,
    /// evicting as needed to stay within budget.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.small.contains(key)? {
            self.small.put(key, value)?;
            debug!(key = %KeyDisplay(key), "updated in small queue");
            return Ok(());
        }

        let fresh = self.main.put(key, value)?;
        debug!(key = %KeyDisplay(key), fresh, "inserted into main queue");
        self.shrink_main()?;
        Ok(())
    }

    /// Places `key` directly into the small queue with a zeroed access
    /// count, evicting the small queue's oldest entries if it overflows.
    ///
    /// This is the cold-admission path for callers that want new keys to
    /// prove themselves in the small queue; [`put`](Self::put) itself
    /// admits into the main queue.
    pub fn admit(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.small.put(key, value)?;
        self.tracker.reset(key);
        debug!(key = %KeyDisplay(key), "admitted into small queue");
        self.shrink_small()?;
        Ok(())
    }

    /// Demotes small-queue residents that have gone cold (idle past the
    /// age threshold, or never re-accessed), then prunes stale tracker
    /// entries. Returns the number of keys demoted.
    pub fn sweep(&self) -> Result<usize> {
        let mut demoted = 0;
        for key in self
            .tracker
            .demotion_candidates(self.age_threshold, self.min_access_count)
        {
            match self.small.get(&key) {
                Ok(Some(value)) => match self.demote(&key, &value) {
                    Ok(()) => demoted += 1,
                    Err(err) => {
                        warn!(key = %KeyDisplay(&key), %err, "sweep demotion failed")
                    },
                },
                Ok(None) => {},
                Err(err) => warn!(key = %KeyDisplay(&key), %err, "sweep lookup failed"),
            }
        }

        let pruned = self.tracker.sweep(self.age_threshold);
        if demoted > 0 || pruned > 0 {
            debug!(demoted, pruned, "sweep complete");
        }
        Ok(demoted)
    }

    /// Reports which value-bearing queue holds `key`, if any.
    pub fn location(&self, key: &[u8]) -> Result<Option<QueueKind>> {
        if self.small.contains(key)? {
            Ok(Some(QueueKind::Small))
        } else if self.main.contains(key)? {
            Ok(Some(QueueKind::Main))
        } else {
            Ok(None)
        }
    }

    /// Returns `true` if the ghost queue remembers `key`.
    pub fn ghosted(&self, key: &[u8]) -> Result<bool> {
        Ok(self.ghost.contains(key)?)
    }

    /// The access tracker owned by this engine.
    #[inline]
    pub fn tracker(&self) -> &AccessTracker {
        &self.tracker
    }

    /// Queue occupancy snapshot. Hit/miss counters are filled in by the
    /// facade, which owns them.
    pub fn snapshot(&self) -> Result<CacheStats> {
        Ok(CacheStats {
            small_items: self.small.items(),
            main_items: self.main.items(),
            ghost_items: self.ghost.items(),
            small_bytes: self.small.bytes()?,
            main_bytes: self.main.bytes()?,
            ghost_bytes: self.ghost.bytes()?,
            hits: 0,
            misses: 0,
        })
    }

    /// Validates cross-queue invariants: every queue within budget, and
    /// none of the given keys resident in both value-bearing queues.
    ///
    /// Backends cannot enumerate their keys, so callers supply the key
    /// population to check (tests pass their whole workload).
    #[cfg(debug_assertions)]
    pub fn check_invariants<'a, I>(&self, keys: I) -> std::result::Result<(), String>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        if self.small.over_budget() {
            return Err(format!(
                "small queue over budget: {} items",
                self.small.items()
            ));
        }
        if self.main.over_budget() {
            return Err(format!("main queue over budget: {} items", self.main.items()));
        }
        if self.ghost.over_budget() {
            return Err(format!(
                "ghost queue over budget: {} items",
                self.ghost.items()
            ));
        }

        for key in keys {
            let in_small = self.small.contains(key).map_err(|e| e.to_string())?;
            let in_main = self.main.contains(key).map_err(|e| e.to_string())?;
            if in_small && in_main {
                return Err(format!(
                    "key {} resident in both small and main",
                    KeyDisplay(key)
                ));
            }
        }
        Ok(())
    }

    fn roll_promotion(&self) -> bool {
        if self.promotion_probability <= 0.0 {
            return false;
        }
        if self.promotion_probability >= 1.0 {
            return true;
        }
        self.rng.lock().gen::<f64>() < self.promotion_probability
    }

    /// Moves `key` from the main queue into the small queue. On failure
    /// the move is rolled back so the key remains in the main queue only.
    fn promote(
        &self,
        key: &[u8],
        value: &[u8],
        ghosted: bool,
    ) -> std::result::Result<(), StoreError> {
        self.small.put(key, value)?;
        if let Err(err) = self.main.delete(key) {
            let _ = self.small.delete(key);
            return Err(err);
        }
        if ghosted {
            self.ghost.delete(key)?;
        }
        self.shrink_small()
    }

    /// Moves `key` from the small queue to the back of the main queue.
    fn demote(&self, key: &[u8], value: &[u8]) -> std::result::Result<(), StoreError> {
        self.main.put(key, value)?;
        if let Err(err) = self.small.delete(key) {
            let _ = self.main.delete(key);
            return Err(err);
        }
        debug!(key = %KeyDisplay(key), "demoted to main queue");
        self.shrink_main()
    }

    /// Evicts from the small queue until it is within budget: re-accessed
    /// entries graduate into the main queue, untouched ones leave only a
    /// ghost entry behind.
    fn shrink_small(&self) -> std::result::Result<(), StoreError> {
        while self.small.over_budget() {
            let Some((key, value)) = self.small.oldest()? else {
                break;
            };
            if self.tracker.count(&key) > 0 {
                self.main.put(&key, &value)?;
                self.small.delete(&key)?;
                debug!(key = %KeyDisplay(&key), "graduated to main queue");
                self.shrink_main()?;
            } else {
                self.ghost.put(&key, &[])?;
                self.small.delete(&key)?;
                self.trim_ghost()?;
                debug!(key = %KeyDisplay(&key), queue = self.small.name(), "evicted cold entry to ghost");
            }
        }
        Ok(())
    }

    /// Evicts the main queue's oldest entries until it is within budget,
    /// ghosting every key not shadowed by the small queue.
    fn shrink_main(&self) -> std::result::Result<(), StoreError> {
        while self.main.over_budget() {
            let Some((key, _)) = self.main.oldest()? else {
                break;
            };
            if !self.small.contains(&key)? {
                self.ghost.put(&key, &[])?;
                self.trim_ghost()?;
            }
            self.main.delete(&key)?;
            debug!(key = %KeyDisplay(&key), queue = self.main.name(), "evicted oldest entry");
        }
        Ok(())
    }

    /// Drops the ghost queue's oldest keys until it is within budget.
    fn trim_ghost(&self) -> std::result::Result<(), StoreError> {
        while self.ghost.over_budget() {
            let Some((key, _)) = self.ghost.oldest()? else {
                break;
            };
            self.ghost.delete(&key)?;
            debug!(key = %KeyDisplay(&key), queue = self.ghost.name(), "dropped oldest ghost entry");
        }
        Ok(())
    }
}

/// Renders keys for log lines: UTF-8 where possible, hex otherwise.
struct KeyDisplay<'a>(&'a [u8]);

impl std::fmt::Display for KeyDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match std::str::from_utf8(self.0) {
            Ok(text) => f.write_str(text),
            Err(_) => {
                for byte in self.0 {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    /// Ten-entry cache: one small slot, nine main slots, one ghost slot.
    fn policy(probability: f64) -> S3FifoPolicy<MemStore> {
        let mut config = CacheConfig::new("unused", 10 * 4096);
        config.promotion_probability = probability;
        config.rng_seed = Some(7);
        S3FifoPolicy::open(&config).unwrap()
    }

    #[test]
    fn miss_inserts_nothing() {
        let policy = policy(0.0);
        assert_eq!(policy.get(b"nothing").unwrap(), None);
        assert_eq!(policy.location(b"nothing").unwrap(), None);
        assert_eq!(policy.tracker().len(), 0);
    }

    #[test]
    fn put_lands_in_main() {
        let policy = policy(0.0);
        policy.put(b"k", b"v").unwrap();
        assert_eq!(policy.location(b"k").unwrap(), Some(QueueKind::Main));
    }

    #[test]
    fn first_hit_never_promotes() {
        let policy = policy(1.0);
        policy.put(b"k", b"v").unwrap();
        policy.get(b"k").unwrap();
        assert_eq!(policy.location(b"k").unwrap(), Some(QueueKind::Main));
    }

    #[test]
    fn second_hit_promotes_when_probability_is_one() {
        let policy = policy(1.0);
        policy.put(b"k", b"v").unwrap();
        policy.get(b"k").unwrap();
        policy.get(b"k").unwrap();
        assert_eq!(policy.location(b"k").unwrap(), Some(QueueKind::Small));
    }

    #[test]
    fn zero_probability_blocks_probabilistic_promotion() {
        let policy = policy(0.0);
        policy.put(b"k", b"v").unwrap();
        for _ in 0..50 {
            policy.get(b"k").unwrap();
        }
        assert_eq!(policy.location(b"k").unwrap(), Some(QueueKind::Main));
    }

    #[test]
    fn ghost_hit_promotes_despite_zero_probability() {
        // Wider ghost budget so x's ghost entry survives the churn below.
        let mut config = CacheConfig::new("unused", 10 * 4096);
        config.promotion_probability = 0.0;
        config.ghost_ratio = 0.5;
        let policy: S3FifoPolicy<MemStore> = S3FifoPolicy::open(&config).unwrap();

        policy.put(b"x", b"v1").unwrap();

        // Push x out of main; it was never read, so it is ghosted.
        for i in 0..9u32 {
            policy.put(format!("fill-{i}").as_bytes(), b"v").unwrap();
        }
        assert_eq!(policy.location(b"x").unwrap(), None);
        assert!(policy.ghosted(b"x").unwrap());

        policy.put(b"x", b"v2").unwrap();
        policy.get(b"x").unwrap();
        assert_eq!(policy.location(b"x").unwrap(), Some(QueueKind::Small));
        assert!(!policy.ghosted(b"x").unwrap());
    }

    #[test]
    fn small_overflow_graduates_accessed_entries() {
        let policy = policy(1.0);
        // Promote a into the single small slot.
        policy.put(b"a", b"va").unwrap();
        policy.get(b"a").unwrap();
        policy.get(b"a").unwrap();
        assert_eq!(policy.location(b"a").unwrap(), Some(QueueKind::Small));

        // Promote b; the small queue overflows and a (count > 0) must
        // graduate back to main rather than being dropped.
        policy.put(b"b", b"vb").unwrap();
        policy.get(b"b").unwrap();
        policy.get(b"b").unwrap();

        assert_eq!(policy.location(b"b").unwrap(), Some(QueueKind::Small));
        assert_eq!(policy.location(b"a").unwrap(), Some(QueueKind::Main));
        assert!(!policy.ghosted(b"a").unwrap());
    }

    #[test]
    fn admit_places_cold_key_in_small() {
        let policy = policy(0.0);
        policy.admit(b"k", b"v").unwrap();
        assert_eq!(policy.location(b"k").unwrap(), Some(QueueKind::Small));
        assert_eq!(policy.tracker().count(b"k"), 0);
    }

    #[test]
    fn admit_overflow_ghosts_untouched_entries() {
        let policy = policy(0.0);
        policy.admit(b"cold", b"v").unwrap();
        policy.admit(b"next", b"v").unwrap();

        // One small slot: "cold" (count 0) is pushed out as a ghost.
        assert_eq!(policy.location(b"cold").unwrap(), None);
        assert!(policy.ghosted(b"cold").unwrap());
        assert_eq!(policy.location(b"next").unwrap(), Some(QueueKind::Small));
    }

    #[test]
    fn sweep_demotes_idle_small_resident() {
        let mut config = CacheConfig::new("unused", 10 * 4096);
        config.promotion_probability = 0.0;
        config.age_threshold = 8;
        let policy: S3FifoPolicy<MemStore> = S3FifoPolicy::open(&config).unwrap();

        policy.admit(b"k", b"v").unwrap();
        assert_eq!(policy.location(b"k").unwrap(), Some(QueueKind::Small));

        // Advance the logical clock well past the age threshold.
        policy.put(b"other", b"v").unwrap();
        for _ in 0..20 {
            policy.get(b"other").unwrap();
        }

        let demoted = policy.sweep().unwrap();
        assert_eq!(demoted, 1);
        assert_eq!(policy.location(b"k").unwrap(), Some(QueueKind::Main));
    }

    #[test]
    fn overwrite_in_main_returns_latest_value() {
        let policy = policy(0.0);
        policy.put(b"k", b"v1").unwrap();
        policy.put(b"k", b"v2").unwrap();
        assert_eq!(policy.get(b"k").unwrap().as_deref(), Some(&b"v2"[..]));
    }

    #[test]
    fn overwrite_keeps_eviction_order() {
        let policy = policy(0.0);
        policy.put(b"a", b"1").unwrap();
        policy.put(b"b", b"2").unwrap();
        policy.put(b"a", b"1-again").unwrap();

        // Fill main to capacity; "a" is still the oldest and goes first.
        for i in 0..7u32 {
            policy.put(format!("fill-{i}").as_bytes(), b"v").unwrap();
        }
        policy.put(b"trigger", b"v").unwrap();

        assert_eq!(policy.location(b"a").unwrap(), None);
        assert_eq!(policy.location(b"b").unwrap(), Some(QueueKind::Main));
    }
}
