//! RewindErrorCode trait for structured error reporting.

/// Trait for mapping rewind errors to stable error code strings.
/// Every error enum implements this so audit reports and the backup
/// information table can carry a machine-readable code next to the message.
pub trait RewindErrorCode {
    /// Returns the error code string (e.g., "CODEC_UNSUPPORTED_TYPE").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted coded string: `[ERROR_CODE] message`.
    fn coded_message(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

// Error code constants.
pub const CODEC_UNSUPPORTED_TYPE: &str = "CODEC_UNSUPPORTED_TYPE";
pub const CODEC_INVALID_VALUE: &str = "CODEC_INVALID_VALUE";
pub const CAPTURE_INCONSISTENCY: &str = "CAPTURE_INCONSISTENCY";
pub const CAPTURE_ERROR: &str = "CAPTURE_ERROR";
pub const SNAPSHOT_MISMATCH: &str = "SNAPSHOT_MISMATCH";
pub const PROVIDER_ERROR: &str = "PROVIDER_ERROR";
pub const EXECUTION_FAILED: &str = "EXECUTION_FAILED";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const BACKUP_WRITE_FAILURE: &str = "BACKUP_WRITE_FAILURE";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const CANCELLED: &str = "CANCELLED";
