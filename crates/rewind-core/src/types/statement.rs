//! Statement model handed over by the SQL parser.
//!
//! The parser itself lives outside this workspace. It hands each audited
//! statement over as an [`AuditedStatement`]: the original text plus a closed
//! [`Statement`] enum carrying only what rollback generation needs.

use serde::{Deserialize, Serialize};

use super::identifiers::TableName;
use super::schema::{ColumnDef, IndexDef, TableOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditedStatement {
    pub sql: String,
    pub statement: Statement,
}

impl AuditedStatement {
    pub fn new(sql: impl Into<String>, statement: Statement) -> Self {
        Self {
            sql: sql.into(),
            statement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    UseDatabase { database: String },
    Select,
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    CreateTable(CreateTableStatement),
    AlterTable(AlterTableStatement),
    DropTable(DropTableStatement),
    RenameTable(RenameTableStatement),
    CreateIndex(CreateIndexStatement),
    DropIndex(DropIndexStatement),
    CreateDatabase { database: String },
    DropDatabase { database: String },
    Truncate { table: TableName },
    /// Anything else the parser accepted (SET, SHOW, transaction control).
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertStatement {
    pub table: TableName,
    /// Target columns; empty means all columns in declared order.
    pub columns: Vec<String>,
    pub source: InsertSource,
    pub ignore: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InsertSource {
    Values(Vec<Vec<InsertValue>>),
    /// Text of the SELECT feeding the insert.
    Select(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InsertValue {
    /// Literal in the server's text form, unquoted (`1`, `abc`, `2019-01-01`).
    Literal(Vec<u8>),
    Null,
    /// `DEFAULT` keyword.
    Default,
    /// Any expression the server evaluates (`now()`, `uuid()`, `c1+1`).
    Expression(String),
}

impl InsertValue {
    pub fn text(s: impl AsRef<str>) -> Self {
        Self::Literal(s.as_ref().as_bytes().to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: String,
    /// Right-hand side as SQL text.
    pub expression: String,
}

impl Assignment {
    pub fn new(column: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            expression: expression.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatement {
    pub table: TableName,
    pub assignments: Vec<Assignment>,
    pub predicate: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteStatement {
    pub table: TableName,
    pub predicate: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTableStatement {
    pub table: TableName,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterTableStatement {
    pub table: TableName,
    pub specs: Vec<AlterSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnPosition {
    First,
    After(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlterSpec {
    AddColumns(Vec<ColumnDef>),
    DropColumn(String),
    ModifyColumn {
        column: ColumnDef,
        position: Option<ColumnPosition>,
    },
    ChangeColumn {
        old_name: String,
        column: ColumnDef,
        position: Option<ColumnPosition>,
    },
    /// `ALTER COLUMN c SET DEFAULT x` (`Some`) or `DROP DEFAULT` (`None`).
    AlterColumnDefault {
        column: String,
        default: Option<String>,
    },
    AddIndex(IndexDef),
    DropIndex(String),
    DropPrimaryKey,
    RenameTo(TableName),
    Options(TableOptions),
    ConvertCharset {
        charset: String,
        collation: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTableStatement {
    pub tables: Vec<TableName>,
    pub if_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameTableStatement {
    /// `(from, to)` pairs in statement order.
    pub pairs: Vec<(TableName, TableName)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndexStatement {
    pub table: TableName,
    pub index: IndexDef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropIndexStatement {
    pub table: TableName,
    pub name: String,
}
