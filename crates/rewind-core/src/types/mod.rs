//! Shared data model.

pub mod identifiers;
pub mod record;
pub mod schema;
pub mod sql;
pub mod statement;
pub mod stats;
pub mod value;

pub use identifiers::{
    quote_ident, BackupLocation, OpId, OpIdGenerator, SourceIdent, TableIdent, TableName,
};
pub use record::{OperationRecord, RollbackBlock, RollbackIssue, SkipReason, StatementKind};
pub use schema::{
    ColumnDef, ColumnDefault, IndexColumn, IndexDef, IndexKind, SchemaSnapshot, TableOptions,
    TableSchema,
};
pub use sql::SqlText;
pub use statement::{
    AlterSpec, AlterTableStatement, Assignment, AuditedStatement, ColumnPosition,
    CreateIndexStatement, CreateTableStatement, DeleteStatement, DropIndexStatement,
    DropTableStatement, InsertSource, InsertStatement, InsertValue, RenameTableStatement,
    Statement, UpdateStatement,
};
pub use stats::{StatCategory, StatisticsCounters};
pub use value::{RawCell, RowImage, Value};
