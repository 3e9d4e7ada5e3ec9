//! s3fifo-kv: a scan-resistant S3-FIFO cache engine over pluggable
//! FIFO-ordered key-value stores.
//!
//! Three cooperating queues (a small hot-candidate queue, a large main
//! queue, and a metadata-only ghost queue) decide where every key lives,
//! when it is promoted or demoted, and what gets evicted. Each queue is
//! materialized by a [`store::FifoStore`] backend: in-memory by default,
//! persisted per queue under a base directory with the `rocksdb` feature.
//!
//! See [`policy::s3_fifo`] for the algorithm and [`cache::Cache`] for the
//! public entry point.

pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod stats;
pub mod store;
pub mod tracker;
