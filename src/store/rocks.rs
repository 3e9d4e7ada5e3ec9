//! Persistent [`FifoStore`] implementation over RocksDB.
//!
//! RocksDB iterates in key order, not write order, so insertion order is
//! maintained explicitly with a sequence index. Each live entry occupies
//! three keyspace slots:
//!
//! ```text
//!   d:<key>        -> value            point lookups
//!   s:<key>        -> seq (u64 BE)     key -> queue position
//!   q:<seq, u64 BE>-> key              oldest-first scan
//! ```
//!
//! `oldest()` is a forward scan from the `q:` prefix; big-endian sequence
//! encoding makes lexicographic order equal numeric order. Overwrites only
//! rewrite the `d:` slot, so a key keeps its original queue position.
//!
//! Compression is disabled: entries are opaque byte payloads managed by an
//! eviction policy, and recompressing them on every level movement costs
//! more than it saves. Compaction is left at the engine default: the
//! cache layer owns eviction, and letting RocksDB drop whole files on its
//! own would desynchronize the sequence index.
//!
//! Writes go through a [`WriteBatch`] under a store-local mutex so the
//! three slots of an entry change together even with concurrent callers;
//! reads are lock-free.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rocksdb::{DBCompressionType, Direction, IteratorMode, Options, WriteBatch, DB};
use tracing::debug;

use crate::error::StoreError;
use crate::store::traits::FifoStore;

const DATA_PREFIX: &[u8] = b"d:";
const SEQ_PREFIX: &[u8] = b"s:";
const QUEUE_PREFIX: &[u8] = b"q:";

fn data_key(key: &[u8]) -> Vec<u8> {
    [DATA_PREFIX, key].concat()
}

fn seq_key(key: &[u8]) -> Vec<u8> {
    [SEQ_PREFIX, key].concat()
}

fn queue_key(seq: u64) -> Vec<u8> {
    [QUEUE_PREFIX, &seq.to_be_bytes()[..]].concat()
}

/// Persistent FIFO-ordered KV store backed by RocksDB.
///
/// Reopening a directory adopts its existing contents; the item counter
/// and next sequence number are rebuilt from the index on open.
pub struct RocksStore {
    db: DB,
    next_seq: AtomicU64,
    items: AtomicU64,
    /// Serializes multi-slot writes; reads do not take it.
    write_lock: Mutex<()>,
}

impl RocksStore {
    fn bootstrap(db: &DB) -> Result<(u64, u64), StoreError> {
        let mut items = 0u64;
        for entry in db.iterator(IteratorMode::From(SEQ_PREFIX, Direction::Forward)) {
            let (key, _) = entry?;
            if !key.starts_with(SEQ_PREFIX) {
                break;
            }
            items += 1;
        }

        // One step back from the end of the q: range lands on the highest
        // sequence in use.
        let mut next_seq = 0u64;
        let after_queue = [QUEUE_PREFIX[0], QUEUE_PREFIX[1] + 1];
        for entry in db.iterator(IteratorMode::From(&after_queue, Direction::Reverse)) {
            let (key, _) = entry?;
            if !key.starts_with(QUEUE_PREFIX) {
                break;
            }
            let raw: [u8; 8] = key[QUEUE_PREFIX.len()..]
                .try_into()
                .map_err(|_| StoreError::backend("malformed queue index key"))?;
            next_seq = u64::from_be_bytes(raw) + 1;
            break;
        }

        Ok((items, next_seq))
    }
}

impl FifoStore for RocksStore {
    fn open(dir: &Path, _budget_bytes: u64) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(DBCompressionType::None);
        opts.set_max_open_files(256);

        let db = DB::open(&opts, dir)?;
        let (items, next_seq) = Self::bootstrap(&db)?;
        debug!(path = %dir.display(), items, next_seq, "opened rocksdb queue");

        Ok(Self {
            db,
            next_seq: AtomicU64::new(next_seq),
            items: AtomicU64::new(items),
            write_lock: Mutex::new(()),
        })
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();

        if self.db.get_pinned(seq_key(key))?.is_some() {
            self.db.put(data_key(key), value)?;
            return Ok(false);
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut batch = WriteBatch::default();
        batch.put(data_key(key), value);
        batch.put(seq_key(key), seq.to_be_bytes());
        batch.put(queue_key(seq), key);
        self.db.write(batch)?;
        self.items.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(data_key(key))?)
    }

    fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.db.get_pinned(seq_key(key))?.is_some())
    }

    fn delete(&self, key: &[u8]) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();

        let Some(raw) = self.db.get_pinned(seq_key(key))? else {
            return Ok(false);
        };
        let seq: [u8; 8] = raw
            .as_ref()
            .try_into()
            .map_err(|_| StoreError::backend("malformed sequence entry"))?;

        let mut batch = WriteBatch::default();
        batch.delete(data_key(key));
        batch.delete(seq_key(key));
        batch.delete(queue_key(u64::from_be_bytes(seq)));
        self.db.write(batch)?;
        self.items.fetch_sub(1, Ordering::Relaxed);
        Ok(true)
    }

    fn oldest(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
        for entry in self
            .db
            .iterator(IteratorMode::From(QUEUE_PREFIX, Direction::Forward))
        {
            let (index_key, user_key) = entry?;
            if !index_key.starts_with(QUEUE_PREFIX) {
                break;
            }
            match self.db.get(data_key(&user_key))? {
                Some(value) => return Ok(Some((user_key.into_vec(), value))),
                // A concurrent delete can race the scan; move on.
                None => continue,
            }
        }
        Ok(None)
    }

    fn len(&self) -> Result<u64, StoreError> {
        Ok(self.items.load(Ordering::Relaxed))
    }

    fn bytes(&self) -> Result<u64, StoreError> {
        let sst = self
            .db
            .property_int_value("rocksdb.live-sst-files-size")?
            .unwrap_or(0);
        let memtables = self
            .db
            .property_int_value("rocksdb.cur-size-all-mem-tables")?
            .unwrap_or(0);
        Ok(sst + memtables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> RocksStore {
        RocksStore::open(dir.path(), 1 << 20).unwrap()
    }

    #[test]
    fn put_get_delete_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        assert!(store.put(b"k", b"v").unwrap());
        assert_eq!(store.get(b"k").unwrap().as_deref(), Some(&b"v"[..]));
        assert!(store.contains(b"k").unwrap());
        assert!(store.delete(b"k").unwrap());
        assert!(!store.contains(b"k").unwrap());
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn oldest_follows_insertion_order_not_key_order() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        // Lexicographically descending keys, inserted in this order.
        store.put(b"zebra", b"1").unwrap();
        store.put(b"mid", b"2").unwrap();
        store.put(b"alpha", b"3").unwrap();

        let (key, _) = store.oldest().unwrap().unwrap();
        assert_eq!(key, b"zebra");

        store.delete(b"zebra").unwrap();
        let (key, _) = store.oldest().unwrap().unwrap();
        assert_eq!(key, b"mid");
    }

    #[test]
    fn overwrite_keeps_queue_position() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        store.put(b"a", b"1").unwrap();
        store.put(b"b", b"2").unwrap();
        assert!(!store.put(b"a", b"one").unwrap());

        let (key, value) = store.oldest().unwrap().unwrap();
        assert_eq!(key, b"a");
        assert_eq!(value, b"one");
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn reopen_recovers_contents_and_order() {
        let dir = TempDir::new().unwrap();
        {
            let store = open(&dir);
            store.put(b"first", b"1").unwrap();
            store.put(b"second", b"2").unwrap();
        }

        let store = open(&dir);
        assert_eq!(store.len().unwrap(), 2);
        let (key, _) = store.oldest().unwrap().unwrap();
        assert_eq!(key, b"first");

        // Fresh inserts must sort after recovered ones.
        store.put(b"third", b"3").unwrap();
        store.delete(b"first").unwrap();
        store.delete(b"second").unwrap();
        let (key, _) = store.oldest().unwrap().unwrap();
        assert_eq!(key, b"third");
    }
}
