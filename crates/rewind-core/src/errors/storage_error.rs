//! Backup store errors.

use super::error_code::{self, RewindErrorCode};

/// Storage-layer errors for the backup store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    /// A batch could not be persisted after all retries. The records stay queued.
    #[error("backup write to {location} failed after {attempts} attempts: {message}")]
    BackupWriteFailure {
        location: String,
        attempts: u32,
        message: String,
    },
}

impl RewindErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SqliteError { .. } => error_code::STORAGE_ERROR,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::BackupWriteFailure { .. } => error_code::BACKUP_WRITE_FAILURE,
        }
    }
}
