//! Backup batching: per-table queues flushed in single transactions.

pub mod writer;

pub use writer::{BackupBatch, BackupBatchWriter, BatchPolicy, FlushStats};
