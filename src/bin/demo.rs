//! Interactive walkthrough of the cache policy.
//!
//! Runs two small workloads against a ten-slot cache and prints the queue
//! state between phases: the classic insert-and-promote sequence, then a
//! scan over twenty one-shot keys that the hot set must survive.
//!
//! Set `RUST_LOG=debug` to watch every promotion and eviction decision.

use s3fifo_kv::builder::CacheBuilder;
use s3fifo_kv::cache::MemoryCache;
use s3fifo_kv::error::Result;
use tracing_subscriber::EnvFilter;

const SLOT: u64 = 4096;

fn ten_slot_cache(dir: &std::path::Path) -> Result<MemoryCache> {
    CacheBuilder::new(dir, 10 * SLOT)
        .promotion_probability(1.0) // deterministic promotions for the demo
        .build()
}

fn paper_walkthrough(dir: &std::path::Path) -> Result<()> {
    println!("=== insert/promote walkthrough ===");
    let cache = ten_slot_cache(dir)?;

    for key in [b"A", b"B", b"C"] {
        cache.put(key, b"payload")?;
    }
    println!("\nafter inserting A, B, C:");
    cache.print_state()?;

    // Two reads push A through the promotion gate.
    cache.get(b"A")?;
    cache.get(b"A")?;
    println!("\nafter reading A twice (promoted to the small queue):");
    cache.print_state()?;

    for key in [&b"D"[..], b"E", b"F", b"G", b"H", b"I", b"J", b"K"] {
        cache.put(key, b"payload")?;
    }
    println!("\nafter inserting D through K (evictions have begun):");
    cache.print_state()?;

    println!("\nA still cached: {}", cache.get(b"A")?.is_some());
    println!("K still cached: {}", cache.get(b"K")?.is_some());
    Ok(())
}

fn scan_resistance(dir: &std::path::Path) -> Result<()> {
    println!("\n=== scan resistance ===");
    // Three small-queue slots so the whole hot set fits.
    let cache = CacheBuilder::new(dir, 10 * SLOT)
        .small_ratio(0.3)
        .promotion_probability(1.0)
        .build()?;

    // Establish a hot set.
    for key in [b"A", b"B", b"C"] {
        cache.put(key, b"hot")?;
        cache.get(key)?;
        cache.get(key)?;
    }
    println!("\nhot set established (A, B, C promoted):");
    cache.print_state()?;

    // One-shot scan: twenty keys, never read back.
    for i in 1..=20u32 {
        cache.put(format!("X{i}").as_bytes(), b"scan")?;
    }
    println!("\nafter scanning X1..X20:");
    cache.print_state()?;

    let survived = [b"A", b"B", b"C"]
        .iter()
        .filter(|key| cache.get(&key[..]).map(|v| v.is_some()).unwrap_or(false))
        .count();
    println!("\nhot keys surviving the scan: {survived}/3");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let base = std::env::temp_dir().join("s3fifo-kv-demo");
    paper_walkthrough(&base.join("walkthrough"))?;
    scan_resistance(&base.join("scan"))?;
    Ok(())
}
