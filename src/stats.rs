//! Point-in-time cache statistics.

use std::fmt;

/// Snapshot of queue occupancy and request counters.
///
/// Item counts come from the queues' advisory counters, byte figures from
/// the backends' own footprint estimates, and `hits`/`misses` are
/// cumulative since the cache was opened.
///
/// # Example
///
/// ```
/// use s3fifo_kv::stats::CacheStats;
///
/// let mut stats = CacheStats::default();
/// stats.hits = 90;
/// stats.misses = 10;
/// assert!((stats.hit_ratio() - 0.9).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct CacheStats {
    /// Entries resident in the small queue.
    pub small_items: u64,
    /// Entries resident in the main queue.
    pub main_items: u64,
    /// Keys tracked by the ghost queue.
    pub ghost_items: u64,
    /// Approximate byte footprint of the small queue.
    pub small_bytes: u64,
    /// Approximate byte footprint of the main queue.
    pub main_bytes: u64,
    /// Approximate byte footprint of the ghost queue.
    pub ghost_bytes: u64,
    /// Lookups that found a value.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit; 0.0 before any lookup.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Live entries across the small and main queues. Ghost entries are
    /// metadata and excluded.
    #[inline]
    pub fn live_items(&self) -> u64 {
        self.small_items + self.main_items
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ small: {} items/{} B, main: {} items/{} B, ghost: {} items/{} B, \
             hits: {}, misses: {}, hit_ratio: {:.2}% }}",
            self.small_items,
            self.small_bytes,
            self.main_items,
            self.main_bytes,
            self.ghost_items,
            self.ghost_bytes,
            self.hits,
            self.misses,
            self.hit_ratio() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_ratio_handles_no_traffic() {
        assert_eq!(CacheStats::default().hit_ratio(), 0.0);
    }

    #[test]
    fn display_mentions_every_queue() {
        let stats = CacheStats {
            small_items: 1,
            main_items: 9,
            ghost_items: 3,
            hits: 5,
            misses: 5,
            ..CacheStats::default()
        };
        let rendered = stats.to_string();
        assert!(rendered.contains("small: 1"));
        assert!(rendered.contains("main: 9"));
        assert!(rendered.contains("ghost: 3"));
        assert!(rendered.contains("50.00%"));
    }
}
