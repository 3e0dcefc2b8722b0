//! # rewind-storage
//!
//! SQLite backup store for rollback statements and session statistics,
//! plus the per-session batch writer that feeds it.

pub mod batch;
pub mod connection;
pub mod migrations;
pub mod queries;
pub mod store;

pub use batch::{BackupBatchWriter, BatchPolicy, FlushStats};
pub use connection::DatabaseManager;
pub use store::SqliteBackupStore;
