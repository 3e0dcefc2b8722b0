//! Per-session backup batch writer.
//!
//! Records are queued per backup location. A location's batch is written as
//! one all-or-nothing unit when it reaches the batch size, on `flush_all`,
//! and on drop. A batch that keeps failing after its retries stays queued.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rewind_core::config::BackupConfig;
use rewind_core::errors::StorageError;
use rewind_core::traits::BackupStore;
use rewind_core::types::{BackupLocation, OperationRecord};

/// Buffered records for one backup location.
#[derive(Debug, Clone)]
pub struct BackupBatch {
    pub location: BackupLocation,
    pub records: Vec<OperationRecord>,
    pub threshold: usize,
}

impl BackupBatch {
    fn new(location: BackupLocation, threshold: usize) -> Self {
        Self {
            location,
            records: Vec::new(),
            threshold,
        }
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.threshold
    }

    pub fn statement_count(&self) -> usize {
        self.records.iter().map(|r| r.rollback.len()).sum()
    }
}

/// Flush behavior knobs.
#[derive(Debug, Clone, Copy)]
pub struct BatchPolicy {
    pub batch_size: usize,
    pub flush_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 10,
            flush_retries: 2,
            retry_backoff: Duration::from_millis(50),
        }
    }
}

impl BatchPolicy {
    pub fn from_config(config: &BackupConfig) -> Self {
        Self {
            batch_size: config.effective_batch_size(),
            flush_retries: config.effective_flush_retries(),
            retry_backoff: Duration::from_millis(config.effective_retry_backoff_ms()),
        }
    }
}

/// Statistics from the batch writer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushStats {
    pub flushes: usize,
    pub records_written: usize,
    pub statements_written: usize,
    pub retries: usize,
    pub failures: usize,
}

pub struct BackupBatchWriter {
    store: Arc<dyn BackupStore>,
    policy: BatchPolicy,
    batches: BTreeMap<BackupLocation, BackupBatch>,
    stats: FlushStats,
}

impl BackupBatchWriter {
    pub fn new(store: Arc<dyn BackupStore>, policy: BatchPolicy) -> Self {
        Self {
            store,
            policy: BatchPolicy {
                batch_size: policy.batch_size.max(1),
                ..policy
            },
            batches: BTreeMap::new(),
            stats: FlushStats::default(),
        }
    }

    /// Queue a record. Flushes the location's batch when it reaches the batch size.
    /// An `Err` is a warning: the record is still queued.
    pub fn append(
        &mut self,
        location: BackupLocation,
        record: OperationRecord,
    ) -> Result<(), StorageError> {
        let threshold = self.policy.batch_size;
        let batch = self
            .batches
            .entry(location.clone())
            .or_insert_with(|| BackupBatch::new(location.clone(), threshold));
        batch.records.push(record);

        if batch.is_full() {
            self.flush(&location)?;
        }
        Ok(())
    }

    /// Write one location's queued records.
    pub fn flush(&mut self, location: &BackupLocation) -> Result<(), StorageError> {
        let Some(batch) = self.batches.get(location) else {
            return Ok(());
        };
        if batch.records.is_empty() {
            return Ok(());
        }

        let attempts = self.policy.flush_retries + 1;
        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.store.write_batch(&batch.location, &batch.records) {
                Ok(()) => {
                    self.stats.flushes += 1;
                    self.stats.records_written += batch.records.len();
                    self.stats.statements_written += batch.statement_count();
                    tracing::info!(
                        location = %location,
                        records = batch.records.len(),
                        attempt,
                        "flushed backup batch"
                    );
                    self.batches.remove(location);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(location = %location, attempt, error = %e, "backup batch write failed");
                    last_error = Some(e);
                    if attempt < attempts {
                        self.stats.retries += 1;
                        std::thread::sleep(self.policy.retry_backoff);
                    }
                }
            }
        }

        self.stats.failures += 1;
        let message = last_error.map(|e| e.to_string()).unwrap_or_default();
        tracing::warn!(
            location = %location,
            queued = batch.records.len(),
            "backup batch left queued after retries"
        );
        Err(StorageError::BackupWriteFailure {
            location: location.to_string(),
            attempts,
            message,
        })
    }

    /// Flush every queued batch. Returns one failure per batch that stayed queued.
    pub fn flush_all(&mut self) -> Vec<StorageError> {
        let locations: Vec<BackupLocation> = self.batches.keys().cloned().collect();
        locations
            .iter()
            .filter_map(|location| self.flush(location).err())
            .collect()
    }

    /// Number of queued records across all locations.
    pub fn pending_records(&self) -> usize {
        self.batches.values().map(|b| b.records.len()).sum()
    }

    pub fn pending_batches(&self) -> impl Iterator<Item = &BackupBatch> {
        self.batches.values()
    }

    pub fn stats(&self) -> FlushStats {
        self.stats
    }
}

impl Drop for BackupBatchWriter {
    fn drop(&mut self) {
        if self.pending_records() == 0 {
            return;
        }
        let failures = self.flush_all();
        if !failures.is_empty() {
            tracing::warn!(
                failed_batches = failures.len(),
                lost_records = self.pending_records(),
                "backup batches still queued when writer dropped"
            );
        }
    }
}
