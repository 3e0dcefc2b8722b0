//! Rollback generation configuration.

use serde::{Deserialize, Serialize};

/// Configuration for rollback statement generation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RollbackConfig {
    /// Emit only changed columns in UPDATE rollbacks, keyed by primary key. Default: false.
    pub minimal_update: Option<bool>,
    /// Maximum rows captured for a single statement. Default: 100_000.
    pub max_capture_rows: Option<usize>,
}

impl RollbackConfig {
    pub fn effective_minimal_update(&self) -> bool {
        self.minimal_update.unwrap_or(false)
    }

    pub fn effective_max_capture_rows(&self) -> usize {
        self.max_capture_rows.unwrap_or(100_000)
    }
}
