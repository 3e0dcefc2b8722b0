//! Backup store interface.

use crate::errors::StorageError;
use crate::types::{BackupLocation, OperationRecord, SourceIdent, StatisticsCounters};

/// Persistent destination for rollback statements and session statistics.
///
/// Implementations are shared between sessions, so they synchronize
/// internally. `write_batch` is all-or-nothing for the given records.
pub trait BackupStore: Send + Sync {
    fn write_batch(
        &self,
        location: &BackupLocation,
        records: &[OperationRecord],
    ) -> Result<(), StorageError>;

    fn write_statistics(
        &self,
        source: &SourceIdent,
        session_id: u64,
        counters: &StatisticsCounters,
    ) -> Result<(), StorageError>;
}
