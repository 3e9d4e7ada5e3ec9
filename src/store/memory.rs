//! In-memory [`FifoStore`] implementation.
//!
//! The default backend: a hash map from key to `(sequence, value)` plus a
//! sequence-ordered index that yields the FIFO-oldest entry. Overwrites
//! keep the original sequence number, so a key's queue position survives
//! updates, matching the ordering contract in [`crate::store::traits`].
//!
//! All state sits behind a single `parking_lot::RwLock`; reads take the
//! shared lock, mutations the exclusive one. This store ignores the
//! directory path passed to [`FifoStore::open`], so tests and memory-only
//! deployments get a working queue with no filesystem involvement.
//!
//! ## Example
//!
//! ```
//! use std::path::Path;
//! use s3fifo_kv::store::{FifoStore, MemStore};
//!
//! let store = MemStore::open(Path::new("ignored"), 1 << 20).unwrap();
//! store.put(b"a", b"1").unwrap();
//! store.put(b"b", b"2").unwrap();
//! store.put(b"a", b"updated").unwrap(); // keeps "a" oldest
//!
//! let (key, value) = store.oldest().unwrap().unwrap();
//! assert_eq!(key, b"a");
//! assert_eq!(value, b"updated");
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::StoreError;
use crate::store::traits::FifoStore;

struct Slot {
    seq: u64,
    value: Vec<u8>,
}

#[derive(Default)]
struct Inner {
    entries: FxHashMap<Vec<u8>, Slot>,
    /// Insertion order: sequence -> key. Sequences are never reused.
    order: BTreeMap<u64, Vec<u8>>,
    next_seq: u64,
    bytes: u64,
}

/// In-memory FIFO-ordered KV store.
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    /// Creates an empty store. Equivalent to [`FifoStore::open`] without
    /// the unused path argument.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_footprint(key: &[u8], value: &[u8]) -> u64 {
    (key.len() + value.len()) as u64
}

impl FifoStore for MemStore {
    fn open(_dir: &Path, _budget_bytes: u64) -> Result<Self, StoreError> {
        Ok(Self::new())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<bool, StoreError> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        if let Some(slot) = inner.entries.get_mut(key) {
            let old_len = slot.value.len() as u64;
            slot.value = value.to_vec();
            inner.bytes = inner.bytes - old_len + value.len() as u64;
            return Ok(false);
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.order.insert(seq, key.to_vec());
        inner.entries.insert(
            key.to_vec(),
            Slot {
                seq,
                value: value.to_vec(),
            },
        );
        inner.bytes += entry_footprint(key, value);
        Ok(true)
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.inner.read().entries.get(key).map(|s| s.value.clone()))
    }

    fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.inner.read().entries.contains_key(key))
    }

    fn delete(&self, key: &[u8]) -> Result<bool, StoreError> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        match inner.entries.remove(key) {
            Some(slot) => {
                inner.order.remove(&slot.seq);
                inner.bytes -= entry_footprint(key, &slot.value);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    fn oldest(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
        let inner = self.inner.read();
        let Some((_, key)) = inner.order.iter().next() else {
            return Ok(None);
        };
        // The order index and the entry map are updated together under the
        // write lock, so the entry must exist.
        let slot = inner
            .entries
            .get(key)
            .ok_or_else(|| StoreError::backend("order index points at missing entry"))?;
        Ok(Some((key.clone(), slot.value.clone())))
    }

    fn len(&self) -> Result<u64, StoreError> {
        Ok(self.inner.read().entries.len() as u64)
    }

    fn bytes(&self) -> Result<u64, StoreError> {
        Ok(self.inner.read().bytes)
    }
}
