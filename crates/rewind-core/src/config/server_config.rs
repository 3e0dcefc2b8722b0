//! Settings mirrored from the audited server.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Mirrors the server's `explicit_defaults_for_timestamp`. Default: true.
    ///
    /// When off, an omitted TIMESTAMP column is filled by the server with the
    /// current time, so the inserted value cannot be pinned in a rollback predicate.
    pub explicit_defaults_for_timestamp: Option<bool>,
    /// Charset reported for rendered CREATE TABLE statements when the snapshot has none.
    pub default_charset: Option<String>,
}

impl ServerConfig {
    pub fn effective_explicit_defaults_for_timestamp(&self) -> bool {
        self.explicit_defaults_for_timestamp.unwrap_or(true)
    }

    pub fn effective_default_charset(&self) -> &str {
        self.default_charset.as_deref().unwrap_or("utf8mb4")
    }
}
