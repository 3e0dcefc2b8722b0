//! Identifiers: operation ids, table identity, backup locations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operation id of one audited statement within a session.
///
/// Rendered as `{timestamp}_{session_id}_{sequence:08}`. Sequence 0 is
/// reserved for "no backup" and is never handed out by a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OpId {
    pub timestamp: i64,
    pub session_id: u64,
    pub sequence: u32,
}

impl OpId {
    /// The "no backup" id for a session.
    pub fn none(timestamp: i64, session_id: u64) -> Self {
        Self {
            timestamp,
            session_id,
            sequence: 0,
        }
    }

    pub fn is_none(&self) -> bool {
        self.sequence == 0
    }

    /// Parse the rendered form back into an `OpId`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.splitn(3, '_');
        let timestamp = parts.next()?.parse().ok()?;
        let session_id = parts.next()?.parse().ok()?;
        let sequence = parts.next()?;
        if sequence.len() < 8 {
            return None;
        }
        Some(Self {
            timestamp,
            session_id,
            sequence: sequence.parse().ok()?,
        })
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{:08}", self.timestamp, self.session_id, self.sequence)
    }
}

/// Hands out monotonically increasing operation ids for one session.
#[derive(Debug)]
pub struct OpIdGenerator {
    session_id: u64,
    next_sequence: u32,
}

impl OpIdGenerator {
    pub fn new(session_id: u64) -> Self {
        Self {
            session_id,
            next_sequence: 1,
        }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Next id stamped with the current wall clock.
    pub fn next_id(&mut self) -> OpId {
        self.next_at(chrono::Utc::now().timestamp())
    }

    /// Next id stamped with an explicit timestamp.
    pub fn next_at(&mut self, timestamp: i64) -> OpId {
        let id = OpId {
            timestamp,
            session_id: self.session_id,
            sequence: self.next_sequence,
        };
        self.next_sequence = self.next_sequence.saturating_add(1);
        id
    }
}

/// A possibly schema-qualified table name as written in a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName {
    pub schema: Option<String>,
    pub name: String,
}

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Resolve against the session's current database.
    pub fn resolve(&self, current_db: Option<&str>) -> Option<TableIdent> {
        let schema = self.schema.as_deref().or(current_db)?;
        Some(TableIdent::new(schema, &self.name))
    }
}

/// A fully resolved table identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableIdent {
    pub schema: String,
    pub name: String,
}

impl TableIdent {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Backtick-quoted `schema`.`name`.
    pub fn quoted(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }
}

impl fmt::Display for TableIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Quote a MySQL identifier with backticks, doubling embedded backticks.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// The audited server a session is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceIdent {
    pub host: String,
    pub port: u16,
}

impl SourceIdent {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host_port` with every character outside `[A-Za-z0-9_]` mapped to `_`.
    pub fn backup_prefix(&self) -> String {
        let host: String = self
            .host
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{}_{}", host, self.port)
    }
}

impl fmt::Display for SourceIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Where the rollback statements of one audited table are stored.
///
/// Backup database: `{host}_{port}_{schema}`; backup table: the audited table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BackupLocation {
    pub database: String,
    pub table: String,
}

impl BackupLocation {
    pub fn for_table(source: &SourceIdent, table: &TableIdent) -> Self {
        Self {
            database: format!("{}_{}", source.backup_prefix(), table.schema),
            table: table.name.clone(),
        }
    }
}

impl fmt::Display for BackupLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}
