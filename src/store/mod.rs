//! Queue storage backends.
//!
//! Each cache queue is materialized as one [`FifoStore`]: an ordered KV
//! store with FIFO iteration. [`MemStore`] is always available;
//! [`RocksStore`] requires the `rocksdb` cargo feature.

pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocks;
pub mod traits;

pub use memory::MemStore;
#[cfg(feature = "rocksdb")]
pub use rocks::RocksStore;
pub use traits::FifoStore;
