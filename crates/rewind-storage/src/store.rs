//! SQLite implementation of the backup store.

use std::path::Path;

use rewind_core::config::BackupConfig;
use rewind_core::errors::StorageError;
use rewind_core::traits::BackupStore;
use rewind_core::types::{
    BackupLocation, OperationRecord, SourceIdent, SqlText, StatisticsCounters,
};

use crate::connection::writer::with_immediate_transaction;
use crate::connection::DatabaseManager;
use crate::queries::backup::{self, BackupOperationRow};
use crate::queries::statistics::{self, StatisticsRow};

/// Backup store persisting into one SQLite database.
pub struct SqliteBackupStore {
    db: DatabaseManager,
}

impl SqliteBackupStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self {
            db: DatabaseManager::open(path)?,
        })
    }

    /// Open the store at the configured path, creating its directory.
    pub fn open_configured(config: &BackupConfig) -> Result<Self, StorageError> {
        let path = config.effective_store_path();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| StorageError::SqliteError {
                message: format!("cannot create {}: {e}", dir.display()),
            })?;
        }
        Self::open(&path)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            db: DatabaseManager::open_in_memory()?,
        })
    }

    /// Number of information rows written so far.
    pub fn operation_count(&self) -> Result<i64, StorageError> {
        self.db.with_reader(backup::count_operations)
    }

    /// Rollback statements stored for `opid`, in generation order.
    pub fn rollback_statements(&self, opid: &str) -> Result<Vec<SqlText>, StorageError> {
        self.db.with_reader(|conn| backup::rollback_statements(conn, opid))
    }

    pub fn operation(&self, opid: &str) -> Result<Option<BackupOperationRow>, StorageError> {
        self.db.with_reader(|conn| backup::get_operation(conn, opid))
    }

    /// Operations stored for one audited table, newest first.
    pub fn operations_for_table(
        &self,
        location: &BackupLocation,
    ) -> Result<Vec<BackupOperationRow>, StorageError> {
        self.db
            .with_reader(|conn| backup::operations_for_table(conn, location))
    }

    pub fn operations_for_session(
        &self,
        session_id: u64,
    ) -> Result<Vec<BackupOperationRow>, StorageError> {
        self.db
            .with_reader(|conn| backup::operations_for_session(conn, session_id))
    }

    pub fn backup_tables(&self) -> Result<Vec<BackupLocation>, StorageError> {
        self.db.with_reader(backup::list_backup_tables)
    }

    pub fn statistics(
        &self,
        source: &SourceIdent,
        session_id: u64,
    ) -> Result<Option<StatisticsRow>, StorageError> {
        self.db.with_reader(|conn| {
            statistics::get_statistics(conn, &source.to_string(), session_id)
        })
    }

    pub fn latest_statistics(&self, source: &SourceIdent) -> Result<Option<StatisticsRow>, StorageError> {
        self.db
            .with_reader(|conn| statistics::latest_statistics(conn, &source.to_string()))
    }
}

impl BackupStore for SqliteBackupStore {
    fn write_batch(
        &self,
        location: &BackupLocation,
        records: &[OperationRecord],
    ) -> Result<(), StorageError> {
        if records.is_empty() {
            return Ok(());
        }
        let now = chrono::Utc::now().timestamp();
        let written = self.db.with_writer(|conn| {
            with_immediate_transaction(conn, |tx| {
                let store_table = backup::ensure_backup_table(tx, location, now)?;
                let mut statements = 0;
                for record in records {
                    backup::insert_operation(tx, location, record, now)?;
                    statements += backup::insert_rollback_statements(tx, &store_table, record)?;
                }
                Ok(statements)
            })
        })?;
        tracing::debug!(
            location = %location,
            records = records.len(),
            statements = written,
            "batch persisted"
        );
        Ok(())
    }

    fn write_statistics(
        &self,
        source: &SourceIdent,
        session_id: u64,
        counters: &StatisticsCounters,
    ) -> Result<(), StorageError> {
        let now = chrono::Utc::now().timestamp();
        self.db.with_writer(|conn| {
            statistics::upsert_statistics(conn, &source.to_string(), session_id, counters, now)
        })
    }
}
