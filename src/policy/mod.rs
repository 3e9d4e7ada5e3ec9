//! Cache policy implementations.

mod queue;
pub mod s3_fifo;

pub use s3_fifo::{QueueKind, S3FifoPolicy};
