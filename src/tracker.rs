//! Per-key access accounting.
//!
//! The tracker is the only shared mutable in-memory structure in the
//! cache: a map from key to `(count, last_access)` behind a single mutex,
//! plus a lock-free logical clock that ticks on every recorded access.
//! Queue residency lives in the backends; the tracker holds bare
//! byte-keyed associations and is cleaned independently via [`sweep`] or
//! [`forget`], so there is no ownership cycle between the two.
//!
//! One tracker belongs to exactly one cache instance: counts are
//! meaningless across instances and the clock domains would mix.
//!
//! [`sweep`]: AccessTracker::sweep
//! [`forget`]: AccessTracker::forget
//!
//! ## Example
//!
//! ```
//! use s3fifo_kv::tracker::AccessTracker;
//!
//! let tracker = AccessTracker::new();
//! assert_eq!(tracker.observe(b"page").count, 1);
//! assert_eq!(tracker.observe(b"page").count, 2);
//! assert_eq!(tracker.count(b"page"), 2);
//! assert_eq!(tracker.count(b"never-seen"), 0);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy)]
struct AccessInfo {
    count: u32,
    last_access: u64,
}

/// Result of recording one access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Access count including this observation.
    pub count: u32,
    /// Logical ticks since the key's previous observation; 0 for a key
    /// seen for the first time.
    pub idle: u64,
}

/// Concurrent access counter with a logical recency clock.
#[derive(Debug, Default)]
pub struct AccessTracker {
    clock: AtomicU64,
    entries: Mutex<FxHashMap<Vec<u8>, AccessInfo>>,
}

impl AccessTracker {
    /// Creates an empty tracker with the clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current logical time. Advances by one per recorded access.
    #[inline]
    pub fn now(&self) -> u64 {
        self.clock.load(Ordering::Relaxed)
    }

    /// Records an access: bumps the key's count, stamps the current tick,
    /// and reports how long the key had been idle.
    pub fn observe(&self, key: &[u8]) -> Observation {
        let tick = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(info) => {
                let idle = tick - info.last_access;
                info.count = info.count.saturating_add(1);
                info.last_access = tick;
                Observation {
                    count: info.count,
                    idle,
                }
            },
            None => {
                entries.insert(
                    key.to_vec(),
                    AccessInfo {
                        count: 1,
                        last_access: tick,
                    },
                );
                Observation { count: 1, idle: 0 }
            },
        }
    }

    /// Access count for `key`; 0 if the key has never been observed (or
    /// was forgotten).
    pub fn count(&self, key: &[u8]) -> u32 {
        self.entries.lock().get(key).map_or(0, |info| info.count)
    }

    /// Resets `key`'s count to zero, keeping it tracked from the current
    /// tick. Used when a key is re-admitted after going cold.
    pub fn reset(&self, key: &[u8]) {
        let tick = self.now();
        self.entries.lock().insert(
            key.to_vec(),
            AccessInfo {
                count: 0,
                last_access: tick,
            },
        );
    }

    /// Drops `key`'s entry entirely.
    pub fn forget(&self, key: &[u8]) {
        self.entries.lock().remove(key);
    }

    /// Removes entries whose last access is older than `now - threshold`.
    /// Returns how many were removed.
    pub fn sweep(&self, threshold: u64) -> usize {
        let now = self.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, info| now.saturating_sub(info.last_access) <= threshold);
        before - entries.len()
    }

    /// Keys that look cold right now: idle longer than `age_threshold`,
    /// or observed fewer than `min_count` times. Feeds the demotion sweep.
    pub fn demotion_candidates(&self, age_threshold: u64, min_count: u32) -> Vec<Vec<u8>> {
        let now = self.now();
        self.entries
            .lock()
            .iter()
            .filter(|(_, info)| {
                now.saturating_sub(info.last_access) > age_threshold || info.count < min_count
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_increments_and_stamps() {
        let tracker = AccessTracker::new();
        let first = tracker.observe(b"k");
        assert_eq!(first.count, 1);
        assert_eq!(first.idle, 0);

        tracker.observe(b"other");
        tracker.observe(b"other");

        let again = tracker.observe(b"k");
        assert_eq!(again.count, 2);
        assert_eq!(again.idle, 3); // two "other" ticks plus our own
    }

    #[test]
    fn count_is_zero_for_unknown_keys() {
        let tracker = AccessTracker::new();
        assert_eq!(tracker.count(b"nope"), 0);
    }

    #[test]
    fn reset_zeroes_but_keeps_tracking() {
        let tracker = AccessTracker::new();
        tracker.observe(b"k");
        tracker.observe(b"k");
        tracker.reset(b"k");
        assert_eq!(tracker.count(b"k"), 0);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.observe(b"k").count, 1);
    }

    #[test]
    fn forget_removes_entry() {
        let tracker = AccessTracker::new();
        tracker.observe(b"k");
        tracker.forget(b"k");
        assert!(tracker.is_empty());
    }

    #[test]
    fn sweep_drops_only_stale_entries() {
        let tracker = AccessTracker::new();
        tracker.observe(b"old");
        for _ in 0..10 {
            tracker.observe(b"hot");
        }

        let removed = tracker.sweep(5);
        assert_eq!(removed, 1);
        assert_eq!(tracker.count(b"old"), 0);
        assert_eq!(tracker.count(b"hot"), 10);
    }

    #[test]
    fn demotion_candidates_catch_idle_and_low_count() {
        let tracker = AccessTracker::new();
        tracker.observe(b"cold"); // count 1, goes idle
        for _ in 0..20 {
            tracker.observe(b"hot");
        }

        let candidates = tracker.demotion_candidates(5, 2);
        assert!(candidates.contains(&b"cold".to_vec()));
        assert!(!candidates.contains(&b"hot".to_vec()));
    }

    #[test]
    fn counts_saturate_instead_of_wrapping() {
        let tracker = AccessTracker::new();
        tracker.reset(b"k");
        {
            let mut entries = tracker.entries.lock();
            entries.get_mut(&b"k"[..]).unwrap().count = u32::MAX;
        }
        assert_eq!(tracker.observe(b"k").count, u32::MAX);
    }
}
