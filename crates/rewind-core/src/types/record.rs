//! Operation records and rollback blocks.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::identifiers::{OpId, TableIdent};
use super::sql::SqlText;

/// Kind of an audited statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    UseDatabase,
    Select,
    Insert,
    Update,
    Delete,
    CreateTable,
    AlterTable,
    DropTable,
    RenameTable,
    CreateIndex,
    DropIndex,
    CreateDatabase,
    DropDatabase,
    Truncate,
    Other,
}

impl StatementKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UseDatabase => "USE",
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::CreateTable => "CREATE TABLE",
            Self::AlterTable => "ALTER TABLE",
            Self::DropTable => "DROP TABLE",
            Self::RenameTable => "RENAME TABLE",
            Self::CreateIndex => "CREATE INDEX",
            Self::DropIndex => "DROP INDEX",
            Self::CreateDatabase => "CREATE DATABASE",
            Self::DropDatabase => "DROP DATABASE",
            Self::Truncate => "TRUNCATE",
            Self::Other => "OTHER",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::UseDatabase,
            Self::Select,
            Self::Insert,
            Self::Update,
            Self::Delete,
            Self::CreateTable,
            Self::AlterTable,
            Self::DropTable,
            Self::RenameTable,
            Self::CreateIndex,
            Self::DropIndex,
            Self::CreateDatabase,
            Self::DropDatabase,
            Self::Truncate,
            Self::Other,
        ]
        .into_iter()
        .find(|k| k.name() == name)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a rollback block is incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollbackIssue {
    CodecUnsupportedType { column: String, column_type: String },
    CodecInvalidValue { column: String, detail: String },
    CaptureInconsistency { row: Option<usize>, detail: String },
    SnapshotMismatch { detail: String },
}

impl fmt::Display for RollbackIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CodecUnsupportedType {
                column,
                column_type,
            } => write!(f, "column `{column}` of type {column_type} cannot be rendered"),
            Self::CodecInvalidValue { column, detail } => {
                write!(f, "column `{column}` holds an invalid value: {detail}")
            }
            Self::CaptureInconsistency {
                row: Some(row),
                detail,
            } => write!(f, "row {row}: {detail}"),
            Self::CaptureInconsistency { row: None, detail } => f.write_str(detail),
            Self::SnapshotMismatch { detail } => write!(f, "snapshot mismatch: {detail}"),
        }
    }
}

/// Ordered rollback statements for one audited statement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RollbackBlock {
    pub statements: Vec<SqlText>,
    pub issues: Vec<RollbackIssue>,
}

impl RollbackBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, statement: impl Into<SqlText>) {
        self.statements.push(statement.into());
    }

    pub fn flag(&mut self, issue: RollbackIssue) {
        self.issues.push(issue);
    }

    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }
}

/// One audited statement and its rollback, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Position of the statement in the session.
    pub sequence: u32,
    pub sql: String,
    pub kind: StatementKind,
    pub affected_rows: u64,
    pub op_id: OpId,
    pub table: TableIdent,
    pub rollback: RollbackBlock,
}

impl OperationRecord {
    pub fn is_incomplete(&self) -> bool {
        !self.rollback.is_complete()
    }
}

/// Why a statement produced no operation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Backup is turned off for the session.
    BackupDisabled,
    /// Statement kind never needs a rollback (SELECT, USE, SET, ...).
    NotApplicable,
    /// Statement cannot be reversed (TRUNCATE, CREATE/DROP DATABASE).
    Irreversible,
    /// Statement had nothing to undo (no-op, IF [NOT] EXISTS hit).
    NothingToUndo,
}
