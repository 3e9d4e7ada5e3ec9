//! Budgeted wrapper around one queue backend.
//!
//! Pairs a [`FifoStore`] with its byte budget and an advisory item
//! counter. The counter is maintained from operation results instead of
//! querying the backend, so budget checks are a single atomic load; it is
//! re-synced from `len()` on open and may transiently drift from the
//! exact backend size under concurrent errors, which is acceptable for a
//! budget heuristic.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::StoreError;
use crate::store::FifoStore;

pub(crate) struct BoundedQueue<S: FifoStore> {
    name: &'static str,
    store: S,
    items: AtomicU64,
    budget_bytes: u64,
    avg_entry_size: u64,
}

impl<S: FifoStore> BoundedQueue<S> {
    pub(crate) fn open(
        name: &'static str,
        dir: &Path,
        budget_bytes: u64,
        avg_entry_size: u64,
    ) -> Result<Self, StoreError> {
        let store = S::open(dir, budget_bytes)?;
        let items = store.len()?;
        Ok(Self {
            name,
            store,
            items: AtomicU64::new(items),
            budget_bytes,
            avg_entry_size,
        })
    }

    #[inline]
    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn put(&self, key: &[u8], value: &[u8]) -> Result<bool, StoreError> {
        let fresh = self.store.put(key, value)?;
        if fresh {
            self.items.fetch_add(1, Ordering::Relaxed);
        }
        Ok(fresh)
    }

    pub(crate) fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.store.get(key)
    }

    pub(crate) fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        self.store.contains(key)
    }

    pub(crate) fn delete(&self, key: &[u8]) -> Result<bool, StoreError> {
        let removed = self.store.delete(key)?;
        if removed {
            self.items.fetch_sub(1, Ordering::Relaxed);
        }
        Ok(removed)
    }

    pub(crate) fn oldest(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.store.oldest()
    }

    #[inline]
    pub(crate) fn items(&self) -> u64 {
        self.items.load(Ordering::Relaxed)
    }

    pub(crate) fn bytes(&self) -> Result<u64, StoreError> {
        self.store.bytes()
    }

    /// Budget check: occupancy approximated as `items * avg_entry_size`.
    #[inline]
    pub(crate) fn over_budget(&self) -> bool {
        self.items() * self.avg_entry_size > self.budget_bytes
    }
}
