//! Structural inverses for DDL, computed from the pre-statement snapshot.

use rewind_core::types::{
    quote_ident, AlterSpec, ColumnDefault, CreateIndexStatement, IndexKind, RollbackBlock,
    RollbackIssue, SchemaSnapshot, TableIdent, TableOptions, TableSchema,
};

use super::render::{
    self, add_index_spec, column_definition, create_index_prefix, ColumnStyle, TableCharset,
};
use crate::codec::quote_string;

/// Inputs shared by every DDL inverse.
#[derive(Debug, Clone, Copy)]
pub struct DdlContext<'a> {
    /// Charset printed when the snapshot carries none.
    pub default_charset: &'a str,
    /// An online schema change tool carries out ALTERs on this table.
    pub osc_managed: bool,
}

/// CREATE TABLE → DROP TABLE. Nothing when IF NOT EXISTS met an existing table.
pub fn create_table(table: &TableIdent, before: &SchemaSnapshot) -> RollbackBlock {
    let mut block = RollbackBlock::new();
    if before.is_none() {
        block.push(format!("DROP TABLE {};", table.quoted()));
    }
    block
}

/// DROP TABLE → CREATE TABLE for every table that existed.
///
/// Tables outside the first table's database are recreated under a
/// qualified name.
pub fn drop_table(
    tables: &[(TableIdent, SchemaSnapshot)],
    if_exists: bool,
    ctx: DdlContext<'_>,
) -> RollbackBlock {
    let mut block = RollbackBlock::new();
    let home = tables.first().map(|(ident, _)| ident.schema.as_str());
    for (ident, snapshot) in tables {
        match snapshot {
            Some(schema) if home == Some(ident.schema.as_str()) => {
                block.push(render::create_table(schema, ctx.default_charset))
            }
            Some(schema) => match render::qualified_create_table(schema, ctx.default_charset) {
                Some(sql) => block.push(sql),
                None => block.flag(RollbackIssue::SnapshotMismatch {
                    detail: format!("definition of {ident} does not name its table"),
                }),
            },
            None if if_exists => {}
            None => block.flag(RollbackIssue::SnapshotMismatch {
                detail: format!("table {ident} has no captured definition"),
            }),
        }
    }
    block
}

/// RENAME TABLE a TO b, c TO d → RENAME TABLE d TO c, b TO a.
pub fn rename_table(pairs: &[(TableIdent, TableIdent)]) -> RollbackBlock {
    let mut block = RollbackBlock::new();
    if pairs.is_empty() {
        return block;
    }
    let inverse: Vec<String> = pairs
        .iter()
        .rev()
        .map(|(from, to)| format!("{} TO {}", to.quoted(), from.quoted()))
        .collect();
    block.push(format!("RENAME TABLE {};", inverse.join(", ")));
    block
}

/// CREATE INDEX → DROP INDEX.
pub fn create_index(table: &TableIdent, stmt: &CreateIndexStatement, before: &SchemaSnapshot) -> RollbackBlock {
    let mut block = RollbackBlock::new();
    if let Some(schema) = before {
        if schema.index(&stmt.index.name).is_some() {
            return block;
        }
    }
    block.push(format!(
        "DROP INDEX {} ON {};",
        quote_ident(&stmt.index.name),
        table.quoted()
    ));
    block
}

/// DROP INDEX → CREATE INDEX with the captured kind and columns.
pub fn drop_index(table: &TableIdent, name: &str, before: &SchemaSnapshot) -> RollbackBlock {
    let mut block = RollbackBlock::new();
    let Some(index) = before.as_ref().and_then(|s| s.index(name)) else {
        block.flag(RollbackIssue::SnapshotMismatch {
            detail: format!("index `{name}` not found on {table}"),
        });
        return block;
    };
    let cols = render::index_columns(&index.columns);
    if index.kind == IndexKind::Primary {
        block.push(format!("ALTER TABLE {} ADD PRIMARY KEY({cols});", table.quoted()));
    } else {
        block.push(format!(
            "CREATE {}INDEX {} ON {}({cols});",
            create_index_prefix(index.kind),
            quote_ident(&index.name),
            table.quoted()
        ));
    }
    block
}

/// ALTER TABLE → one ALTER TABLE undoing every spec, inverses in reverse order.
///
/// Each spec is inverted against the table as the earlier specs of the same
/// statement left it. `target` is the name the table has after execution.
pub fn alter_table(
    table: &TableIdent,
    specs: &[AlterSpec],
    before: &SchemaSnapshot,
    ctx: DdlContext<'_>,
) -> RollbackBlock {
    let mut block = RollbackBlock::new();
    let Some(snapshot) = before else {
        block.flag(RollbackIssue::SnapshotMismatch {
            detail: format!("table {table} not found before ALTER"),
        });
        return block;
    };

    let mut working = snapshot.clone();
    let mut target = table.clone();
    let mut groups: Vec<Vec<String>> = Vec::with_capacity(specs.len());

    for spec in specs {
        match invert_spec(spec, &working, &target, ctx) {
            Ok(fragments) => groups.push(fragments),
            Err(issue) => block.flag(issue),
        }
        if let AlterSpec::RenameTo(to) = spec {
            target = TableIdent::new(to.schema.as_deref().unwrap_or(&target.schema), &to.name);
        }
        apply_spec(&mut working, spec);
    }

    let fragments: Vec<String> = groups.into_iter().rev().flatten().collect();
    if !fragments.is_empty() {
        block.push(format!(
            "ALTER TABLE {} {};",
            target.quoted(),
            fragments.join(",")
        ));
    }
    block
}

fn missing(what: &str, table: &TableIdent) -> RollbackIssue {
    RollbackIssue::SnapshotMismatch {
        detail: format!("{what} not found on {table}"),
    }
}

fn invert_spec(
    spec: &AlterSpec,
    working: &TableSchema,
    current: &TableIdent,
    ctx: DdlContext<'_>,
) -> Result<Vec<String>, RollbackIssue> {
    let inherited = TableCharset::of(&working.options, ctx.default_charset);
    let fragments = match spec {
        AlterSpec::AddColumns(columns) => columns
            .iter()
            .rev()
            .map(|c| format!("DROP COLUMN {}", quote_ident(&c.name)))
            .collect(),
        AlterSpec::DropColumn(name) => {
            let old = working
                .column(name)
                .ok_or_else(|| missing(&format!("column `{name}`"), current))?;
            vec![format!(
                "ADD COLUMN {}",
                column_definition(old, ColumnStyle::Alter, inherited)
            )]
        }
        AlterSpec::ModifyColumn { column, .. } => {
            let old = working
                .column(&column.name)
                .ok_or_else(|| missing(&format!("column `{}`", column.name), current))?;
            vec![format!(
                "MODIFY COLUMN {}",
                column_definition(old, ColumnStyle::Alter, inherited)
            )]
        }
        AlterSpec::ChangeColumn {
            old_name, column, ..
        } => {
            let old = working
                .column(old_name)
                .ok_or_else(|| missing(&format!("column `{old_name}`"), current))?;
            vec![format!(
                "CHANGE COLUMN {} {}",
                quote_ident(&column.name),
                column_definition(old, ColumnStyle::Alter, inherited)
            )]
        }
        AlterSpec::AlterColumnDefault { column, .. } => {
            let old = working
                .column(column)
                .ok_or_else(|| missing(&format!("column `{column}`"), current))?;
            let col = quote_ident(&old.name);
            vec![match &old.default {
                ColumnDefault::None => format!("ALTER COLUMN {col} DROP DEFAULT"),
                ColumnDefault::Null => format!("ALTER COLUMN {col} SET DEFAULT NULL"),
                ColumnDefault::Literal(v) => {
                    format!("ALTER COLUMN {col} SET DEFAULT {}", quote_string(v))
                }
                ColumnDefault::Expression(e) => format!("ALTER COLUMN {col} SET DEFAULT ({e})"),
            }]
        }
        AlterSpec::AddIndex(index) => vec![match index.kind {
            IndexKind::Primary => "DROP PRIMARY KEY".to_string(),
            _ => format!("DROP INDEX {}", quote_ident(&index.name)),
        }],
        AlterSpec::DropIndex(name) => match working.index(name) {
            Some(index) => vec![add_index_spec(index)],
            None if ctx.osc_managed => Vec::new(),
            None => return Err(missing(&format!("index `{name}`"), current)),
        },
        AlterSpec::DropPrimaryKey => match working.primary_key() {
            Some(pk) => vec![add_index_spec(pk)],
            None if ctx.osc_managed => Vec::new(),
            None => return Err(missing("primary key", current)),
        },
        AlterSpec::RenameTo(_) => vec![format!("RENAME TO {}", current.quoted())],
        AlterSpec::Options(opts) => invert_options(opts, &working.options, ctx),
        AlterSpec::ConvertCharset { .. } => {
            let charset = working
                .options
                .charset
                .as_deref()
                .unwrap_or(ctx.default_charset);
            let mut fragment = format!("CONVERT TO CHARACTER SET {charset}");
            if let Some(collation) = &working.options.collation {
                fragment.push_str(&format!(" COLLATE {collation}"));
            }
            vec![fragment]
        }
    };
    Ok(fragments)
}

fn invert_options(changed: &TableOptions, old: &TableOptions, ctx: DdlContext<'_>) -> Vec<String> {
    let mut parts = Vec::new();
    if changed.engine.is_some() {
        parts.push(format!("ENGINE={}", old.engine.as_deref().unwrap_or("InnoDB")));
    }
    if changed.charset.is_some() {
        parts.push(format!(
            "DEFAULT CHARSET={}",
            old.charset.as_deref().unwrap_or(ctx.default_charset)
        ));
    }
    if changed.collation.is_some() {
        if let Some(collation) = &old.collation {
            parts.push(format!("COLLATE={collation}"));
        }
    }
    if changed.comment.is_some() {
        parts.push(format!(
            "COMMENT={}",
            quote_string(old.comment.as_deref().unwrap_or(""))
        ));
    }
    if parts.is_empty() {
        Vec::new()
    } else {
        vec![parts.join(" ")]
    }
}

/// Advance the working definition past one spec.
fn apply_spec(working: &mut TableSchema, spec: &AlterSpec) {
    match spec {
        AlterSpec::AddColumns(columns) => working.columns.extend(columns.iter().cloned()),
        AlterSpec::DropColumn(name) => {
            if let Some(pos) = working.column_index(name) {
                working.columns.remove(pos);
            }
        }
        AlterSpec::ModifyColumn { column, .. } => {
            if let Some(pos) = working.column_index(&column.name) {
                working.columns[pos] = column.clone();
            }
        }
        AlterSpec::ChangeColumn {
            old_name, column, ..
        } => {
            if let Some(pos) = working.column_index(old_name) {
                working.columns[pos] = column.clone();
            }
        }
        AlterSpec::AlterColumnDefault { column, default } => {
            if let Some(pos) = working.column_index(column) {
                working.columns[pos].default = match default {
                    Some(v) => ColumnDefault::Literal(v.clone()),
                    None => ColumnDefault::None,
                };
            }
        }
        AlterSpec::AddIndex(index) => working.indexes.push(index.clone()),
        AlterSpec::DropIndex(name) => working.indexes.retain(|i| !i.name.eq_ignore_ascii_case(name)),
        AlterSpec::DropPrimaryKey => working.indexes.retain(|i| i.kind != IndexKind::Primary),
        AlterSpec::RenameTo(to) => {
            if let Some(schema) = &to.schema {
                working.schema = schema.clone();
            }
            working.name = to.name.clone();
        }
        AlterSpec::Options(opts) => {
            let o = &mut working.options;
            if opts.engine.is_some() {
                o.engine = opts.engine.clone();
            }
            if opts.charset.is_some() {
                o.charset = opts.charset.clone();
            }
            if opts.collation.is_some() {
                o.collation = opts.collation.clone();
            }
            if opts.comment.is_some() {
                o.comment = opts.comment.clone();
            }
        }
        AlterSpec::ConvertCharset { charset, collation } => {
            working.options.charset = Some(charset.clone());
            working.options.collation = collation.clone();
        }
    }
}
