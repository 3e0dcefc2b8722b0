//! Audited-database collaborators.

use crate::errors::ProviderError;
use crate::types::{RawCell, SchemaSnapshot};

/// Result of executing one statement on the audited server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOutcome {
    pub affected_rows: u64,
    /// First id generated by an auto-increment column, 0 when none.
    pub last_insert_id: u64,
}

/// Runs SQL against the audited server over the session's connection.
pub trait ExecutionProvider {
    /// Execute a statement that changes data or structure.
    fn execute(&mut self, sql: &str) -> Result<ExecOutcome, ProviderError>;

    /// Run a read-only query and return its rows in server order.
    fn query(&mut self, sql: &str) -> Result<Vec<Vec<RawCell>>, ProviderError>;
}

/// Supplies table definitions as they are right now on the audited server.
pub trait SchemaProvider {
    /// `Ok(None)` when the table does not exist.
    fn snapshot(&self, schema: &str, table: &str) -> Result<SchemaSnapshot, ProviderError>;
}

/// Reports whether an online schema change tool owns ALTERs on a table.
pub trait OnlineSchemaChange {
    fn is_managed(&self, schema: &str, table: &str) -> bool;
}

/// Managed status derived from the pt-osc / gh-ost switches alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredOnlineSchemaChange {
    pub enabled: bool,
}

impl OnlineSchemaChange for ConfiguredOnlineSchemaChange {
    fn is_managed(&self, _schema: &str, _table: &str) -> bool {
        self.enabled
    }
}
