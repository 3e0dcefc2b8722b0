//! Backup configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const DEFAULT_STORE_PATH: &str = ".rewind/backup.db";

/// Configuration for the backup subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BackupConfig {
    /// Whether rollback generation and backup are enabled. Default: true.
    pub enabled: Option<bool>,
    /// Queued records per table that trigger a flush. Default: 10.
    pub batch_size: Option<usize>,
    /// Retries after a failed flush before the batch is left queued. Default: 2.
    pub flush_retries: Option<u32>,
    /// Delay between flush attempts in milliseconds. Default: 50.
    pub retry_backoff_ms: Option<u64>,
    /// Path of the SQLite backup store. Default: `.rewind/backup.db`.
    pub store_path: Option<String>,
}

impl BackupConfig {
    pub fn effective_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(10)
    }

    pub fn effective_flush_retries(&self) -> u32 {
        self.flush_retries.unwrap_or(2)
    }

    pub fn effective_retry_backoff_ms(&self) -> u64 {
        self.retry_backoff_ms.unwrap_or(50)
    }

    pub fn effective_store_path(&self) -> PathBuf {
        PathBuf::from(self.store_path.as_deref().unwrap_or(DEFAULT_STORE_PATH))
    }
}
