// ==============================================
// PERSISTENT BACKEND TESTS (integration)
// ==============================================
//
// Exercises the RocksDB-backed cache across a close/reopen cycle: queue
// contents and FIFO order are adopted from disk, while the access tracker
// always starts cold.

#![cfg(feature = "rocksdb")]

use s3fifo_kv::builder::CacheBuilder;
use s3fifo_kv::cache::PersistentCache;
use s3fifo_kv::policy::QueueKind;
use tempfile::TempDir;

const SLOT: u64 = 4096;

fn open(dir: &TempDir) -> PersistentCache {
    CacheBuilder::new(dir.path(), 10 * SLOT)
        .promotion_probability(1.0)
        .rng_seed(5)
        .build_persistent()
        .unwrap()
}

#[test]
fn basic_roundtrip_on_disk() {
    let dir = TempDir::new().unwrap();
    let cache = open(&dir);

    cache.put(b"k", b"persisted").unwrap();
    assert_eq!(cache.get(b"k").unwrap().as_deref(), Some(&b"persisted"[..]));
    assert_eq!(cache.get(b"missing").unwrap(), None);
}

#[test]
fn reopen_adopts_queue_contents_with_cold_tracker() {
    let dir = TempDir::new().unwrap();
    {
        let cache = open(&dir);
        cache.put(b"warm", b"v").unwrap();
        cache.get(b"warm").unwrap();
        cache.get(b"warm").unwrap(); // promoted into the small queue
        assert_eq!(
            cache.policy().location(b"warm").unwrap(),
            Some(QueueKind::Small)
        );
    }

    let cache = open(&dir);
    // Residency survives the restart; access history does not.
    assert_eq!(
        cache.policy().location(b"warm").unwrap(),
        Some(QueueKind::Small)
    );
    assert_eq!(cache.policy().tracker().count(b"warm"), 0);
    assert_eq!(cache.get(b"warm").unwrap().as_deref(), Some(&b"v"[..]));

    let stats = cache.stats().unwrap();
    assert_eq!(stats.small_items, 1);
    assert_eq!(stats.hits, 1);
}

#[test]
fn eviction_order_survives_restart() {
    let dir = TempDir::new().unwrap();
    {
        let cache = open(&dir);
        for i in 0..5u32 {
            cache.put(format!("k{i}").as_bytes(), b"v").unwrap();
        }
    }

    let cache = open(&dir);
    // Fill the main queue past budget; the pre-restart oldest goes first.
    for i in 5..10u32 {
        cache.put(format!("k{i}").as_bytes(), b"v").unwrap();
    }
    assert_eq!(cache.policy().location(b"k0").unwrap(), None);
    assert!(cache.policy().ghosted(b"k0").unwrap());
    assert_eq!(cache.policy().location(b"k9").unwrap(), Some(QueueKind::Main));
}
