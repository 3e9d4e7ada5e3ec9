//! Backend contract for the three cache queues.
//!
//! The policy engine never talks to a storage engine directly; each queue
//! is an ordered KV store behind the [`FifoStore`] trait. Stores own key
//! and value bytes and their insertion order; the policy owns everything
//! else (access tracking, promotion, eviction decisions).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Cache Engine                            │
//! │                                                                  │
//! │  ┌──────────────────┐        decides          ┌───────────────┐  │
//! │  │  Policy Engine   │────────────────────────►│ BoundedQueue  │  │
//! │  │  (who lives      │   put / delete / oldest │ (budget +     │  │
//! │  │   where)         │◄────────────────────────│  item count)  │  │
//! │  └──────────────────┘        observes         └───────┬───────┘  │
//! │                                                       │ wraps    │
//! │                                                       ▼          │
//! │                                              ┌───────────────┐   │
//! │                                              │   FifoStore   │   │
//! │                                              │ MemStore /    │   │
//! │                                              │ RocksStore    │   │
//! │                                              └───────────────┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering contract
//!
//! `oldest()` must be consistent with insertion order for keys that have
//! not been deleted since they were first inserted. Overwriting a key is
//! permitted and **does not** move it: a key keeps the queue position of
//! its original insertion until it is deleted. The small-queue update rule
//! and the overwrite eviction-order guarantee both depend on this.
//!
//! ## Concurrency
//!
//! Every method takes `&self`; implementations serialize their own
//! internal state. Callers may race `put`/`delete`/`oldest` on the same
//! store, and each individual call is atomic.

use std::path::Path;

use crate::error::StoreError;

/// An ordered key-value store with FIFO iteration, used as one cache queue.
///
/// Keys and values are opaque byte sequences. Implementations must be safe
/// to share across threads; the cache holds one instance per queue and
/// calls it from every caller thread.
pub trait FifoStore: Send + Sync + Sized {
    /// Opens (or creates) a store rooted at `dir`.
    ///
    /// `budget_bytes` is the queue's byte budget; backends may use it to
    /// size internal buffers. In-memory backends ignore `dir`.
    fn open(dir: &Path, budget_bytes: u64) -> Result<Self, StoreError>;

    /// Inserts or overwrites a key.
    ///
    /// Returns `true` when the key was not present (a fresh insert that
    /// takes a new queue position) and `false` on overwrite (original
    /// position kept).
    fn put(&self, key: &[u8], value: &[u8]) -> Result<bool, StoreError>;

    /// Point lookup.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Membership test without fetching the value.
    fn contains(&self, key: &[u8]) -> Result<bool, StoreError>;

    /// Removes a key if present; returns whether it was.
    fn delete(&self, key: &[u8]) -> Result<bool, StoreError>;

    /// Returns the FIFO-oldest entry without removing it.
    fn oldest(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError>;

    /// Current number of entries.
    fn len(&self) -> Result<u64, StoreError>;

    /// Returns `true` if the store holds no entries.
    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Approximate byte footprint of live entries.
    ///
    /// Used for reporting only; budget enforcement goes through the
    /// queue's item counter.
    fn bytes(&self) -> Result<u64, StoreError>;
}
