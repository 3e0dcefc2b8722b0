//! Statistics configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Persist per-session statement counters at teardown. Default: true.
    pub enabled: Option<bool>,
}

impl StatisticsConfig {
    pub fn effective_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}
