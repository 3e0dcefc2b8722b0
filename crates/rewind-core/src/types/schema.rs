//! Table definitions as captured from the audited server.

use serde::{Deserialize, Serialize};

use super::identifiers::TableIdent;

/// Captured definition of one table. An absent table is `None` in a
/// [`SchemaSnapshot`], which is a valid snapshot for CREATE statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub indexes: Vec<IndexDef>,
    pub options: TableOptions,
    /// Verbatim `SHOW CREATE TABLE` text when the provider has it.
    pub create_sql: Option<String>,
}

pub type SchemaSnapshot = Option<TableSchema>;

impl TableSchema {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            options: TableOptions::default(),
            create_sql: None,
        }
    }

    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn ident(&self) -> TableIdent {
        TableIdent::new(&self.schema, &self.name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn index(&self, name: &str) -> Option<&IndexDef> {
        self.indexes.iter().find(|i| i.name.eq_ignore_ascii_case(name))
    }

    pub fn primary_key(&self) -> Option<&IndexDef> {
        self.indexes.iter().find(|i| i.kind == IndexKind::Primary)
    }

    /// Column positions of the primary key, if any.
    pub fn primary_key_columns(&self) -> Option<Vec<usize>> {
        self.primary_key().and_then(|pk| self.index_positions(pk))
    }

    /// Column positions of the first unique key whose columns are all NOT NULL
    /// and not prefix-indexed.
    pub fn usable_unique_columns(&self) -> Option<Vec<usize>> {
        self.indexes
            .iter()
            .filter(|i| i.kind == IndexKind::Unique)
            .filter(|i| i.columns.iter().all(|c| c.prefix_len.is_none()))
            .filter_map(|i| self.index_positions(i))
            .find(|pos| pos.iter().all(|&p| !self.columns[p].nullable))
    }

    /// Primary key, else a usable unique key.
    pub fn row_key_columns(&self) -> Option<Vec<usize>> {
        self.primary_key_columns()
            .or_else(|| self.usable_unique_columns())
    }

    fn index_positions(&self, index: &IndexDef) -> Option<Vec<usize>> {
        index
            .columns
            .iter()
            .map(|c| self.column_index(&c.name))
            .collect()
    }
}

/// One column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    /// Declared type as the server reports it, e.g. `int(11)`, `enum('a','b')`.
    pub column_type: String,
    pub nullable: bool,
    pub default: ColumnDefault,
    pub on_update_current_timestamp: bool,
    pub auto_increment: bool,
    /// Generation expression for generated (virtual/stored) columns.
    pub generated: Option<String>,
    pub comment: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            nullable: true,
            default: ColumnDefault::None,
            on_update_current_timestamp: false,
            auto_increment: false,
            generated: None,
            comment: None,
            charset: None,
            collation: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_literal(mut self, value: impl Into<String>) -> Self {
        self.default = ColumnDefault::Literal(value.into());
        self
    }

    pub fn default_null(mut self) -> Self {
        self.default = ColumnDefault::Null;
        self
    }

    pub fn default_expression(mut self, expr: impl Into<String>) -> Self {
        self.default = ColumnDefault::Expression(expr.into());
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.nullable = false;
        self
    }

    pub fn on_update_current_timestamp(mut self) -> Self {
        self.on_update_current_timestamp = true;
        self
    }

    pub fn generated(mut self, expr: impl Into<String>) -> Self {
        self.generated = Some(expr.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn collate(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn is_generated(&self) -> bool {
        self.generated.is_some()
    }

    /// Base type name, lowercase, without length or attributes.
    pub fn base_type(&self) -> String {
        let t = self.column_type.trim();
        let end = t
            .find(|c: char| c == '(' || c.is_whitespace())
            .unwrap_or(t.len());
        t[..end].to_ascii_lowercase()
    }

    pub fn is_timestamp(&self) -> bool {
        self.base_type() == "timestamp"
    }
}

/// Declared default of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColumnDefault {
    /// No DEFAULT clause.
    #[default]
    None,
    /// `DEFAULT NULL`.
    Null,
    /// A literal, stored unquoted, e.g. `0` or `abc`.
    Literal(String),
    /// A server expression such as `CURRENT_TIMESTAMP`.
    Expression(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    Primary,
    Unique,
    Plain,
    Spatial,
    Fulltext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub name: String,
    pub prefix_len: Option<u32>,
}

impl IndexColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix_len: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    /// `PRIMARY` for primary keys.
    pub name: String,
    pub kind: IndexKind,
    pub columns: Vec<IndexColumn>,
}

impl IndexDef {
    pub fn new<I, S>(name: impl Into<String>, kind: IndexKind, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            columns: columns.into_iter().map(IndexColumn::new).collect(),
        }
    }

    pub fn primary<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("PRIMARY", IndexKind::Primary, columns)
    }
}

/// Table-level options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TableOptions {
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    pub auto_increment: Option<u64>,
}
