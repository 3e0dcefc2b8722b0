//! Row image capture around DML execution.
//!
//! Every statement is captured in two phases: `before` runs ahead of
//! execution against the unchanged table, `rollback` runs once the server
//! reported the outcome and turns the captured images into statements.

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

pub use insert::PendingInsert;
pub use select::DecodedRows;
pub use update::{PendingUpdate, UpdatedRow};

use rewind_core::config::RewindConfig;

/// Capture knobs resolved from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Upper bound on rows read for one statement.
    pub max_rows: usize,
    /// Mirrors the server variable of the same name.
    pub explicit_defaults_for_timestamp: bool,
    /// Restore only changed columns in UPDATE rollbacks.
    pub minimal_update: bool,
}

impl CaptureOptions {
    pub fn from_config(config: &RewindConfig) -> Self {
        Self {
            max_rows: config.rollback.effective_max_capture_rows(),
            explicit_defaults_for_timestamp: config
                .server
                .effective_explicit_defaults_for_timestamp(),
            minimal_update: config.rollback.effective_minimal_update(),
        }
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::from_config(&RewindConfig::default())
    }
}
