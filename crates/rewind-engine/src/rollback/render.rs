//! Rendering of captured definitions back into DDL text.

use rewind_core::types::{
    quote_ident, ColumnDef, ColumnDefault, IndexColumn, IndexDef, IndexKind, TableOptions,
    TableSchema,
};

use crate::codec::quote_string;

/// How a column definition is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStyle {
    /// As `SHOW CREATE TABLE` prints it: nullable columns carry `DEFAULT NULL`.
    ShowCreate,
    /// As written in ALTER specs: implicit `DEFAULT NULL` is left out.
    Alter,
}

/// Character set and collation a table's columns inherit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCharset<'a> {
    pub charset: Option<&'a str>,
    pub collation: Option<&'a str>,
}

impl<'a> TableCharset<'a> {
    pub fn of(options: &'a TableOptions, default_charset: &'a str) -> Self {
        Self {
            charset: Some(options.charset.as_deref().unwrap_or(default_charset)),
            collation: options.collation.as_deref(),
        }
    }
}

/// `` `name` type [CHARACTER SET ..] [COLLATE ..] [NOT NULL] [DEFAULT ..] [ON UPDATE ..] [COMMENT ..] ``
///
/// Charset and collation are spelled out only where they differ from the
/// table's.
pub fn column_definition(column: &ColumnDef, style: ColumnStyle, table: TableCharset<'_>) -> String {
    let mut out = format!("{} {}", quote_ident(&column.name), column.column_type);
    if let Some(charset) = column.charset.as_deref().filter(|c| Some(*c) != table.charset) {
        out.push_str(" CHARACTER SET ");
        out.push_str(charset);
    }
    if let Some(collation) = column.collation.as_deref().filter(|c| Some(*c) != table.collation) {
        out.push_str(" COLLATE ");
        out.push_str(collation);
    }

    if let Some(expr) = &column.generated {
        out.push_str(&format!(" GENERATED ALWAYS AS ({expr})"));
        if !column.nullable {
            out.push_str(" NOT NULL");
        }
        push_comment(&mut out, column);
        return out;
    }

    if !column.nullable {
        out.push_str(" NOT NULL");
    } else if style == ColumnStyle::ShowCreate && column.is_timestamp() {
        out.push_str(" NULL");
    }

    if column.auto_increment {
        out.push_str(" AUTO_INCREMENT");
    }

    match &column.default {
        ColumnDefault::Literal(v) => {
            out.push_str(" DEFAULT ");
            out.push_str(&quote_string(v));
        }
        ColumnDefault::Expression(e) => {
            out.push_str(" DEFAULT ");
            out.push_str(e);
        }
        ColumnDefault::Null | ColumnDefault::None => {
            if style == ColumnStyle::ShowCreate
                && column.nullable
                && !column.auto_increment
                && !has_implicit_null_default(column)
            {
                out.push_str(" DEFAULT NULL");
            }
        }
    }

    if column.on_update_current_timestamp {
        out.push_str(" ON UPDATE CURRENT_TIMESTAMP");
    }
    push_comment(&mut out, column);
    out
}

fn push_comment(out: &mut String, column: &ColumnDef) {
    if let Some(comment) = &column.comment {
        out.push_str(" COMMENT ");
        out.push_str(&quote_string(comment));
    }
}

/// BLOB, TEXT, JSON and spatial columns never show `DEFAULT NULL`.
fn has_implicit_null_default(column: &ColumnDef) -> bool {
    let base = column.base_type();
    base.ends_with("blob")
        || base.ends_with("text")
        || matches!(
            base.as_str(),
            "json"
                | "geometry"
                | "point"
                | "linestring"
                | "polygon"
                | "multipoint"
                | "multilinestring"
                | "multipolygon"
                | "geometrycollection"
                | "geomcollection"
        )
}

/// `` `a`,`b`(10) ``
pub fn index_columns(columns: &[IndexColumn]) -> String {
    columns
        .iter()
        .map(|c| match c.prefix_len {
            Some(len) => format!("{}({len})", quote_ident(&c.name)),
            None => quote_ident(&c.name),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// ALTER spec adding `index`: `ADD UNIQUE INDEX `ix`(`c1`)`.
pub fn add_index_spec(index: &IndexDef) -> String {
    let cols = index_columns(&index.columns);
    match index.kind {
        IndexKind::Primary => format!("ADD PRIMARY KEY({cols})"),
        IndexKind::Unique => format!("ADD UNIQUE INDEX {}({cols})", quote_ident(&index.name)),
        IndexKind::Plain => format!("ADD INDEX {}({cols})", quote_ident(&index.name)),
        IndexKind::Spatial => format!("ADD SPATIAL INDEX {}({cols})", quote_ident(&index.name)),
        IndexKind::Fulltext => format!("ADD FULLTEXT INDEX {}({cols})", quote_ident(&index.name)),
    }
}

/// Keyword preceding `INDEX` in `CREATE ... INDEX`.
pub fn create_index_prefix(kind: IndexKind) -> &'static str {
    match kind {
        IndexKind::Unique => "UNIQUE ",
        IndexKind::Spatial => "SPATIAL ",
        IndexKind::Fulltext => "FULLTEXT ",
        IndexKind::Primary | IndexKind::Plain => "",
    }
}

fn key_line(index: &IndexDef) -> String {
    let cols = index_columns(&index.columns);
    let name = quote_ident(&index.name);
    match index.kind {
        IndexKind::Primary => format!("PRIMARY KEY ({cols})"),
        IndexKind::Unique => format!("UNIQUE KEY {name} ({cols})"),
        IndexKind::Plain => format!("KEY {name} ({cols})"),
        IndexKind::Spatial => format!("SPATIAL KEY {name} ({cols})"),
        IndexKind::Fulltext => format!("FULLTEXT KEY {name} ({cols})"),
    }
}

/// `CREATE TABLE` text for a captured table, table name unqualified.
///
/// The provider's verbatim definition wins when present.
pub fn create_table(schema: &TableSchema, default_charset: &str) -> String {
    if let Some(sql) = &schema.create_sql {
        let sql = sql.trim_end();
        return if sql.ends_with(';') {
            sql.to_string()
        } else {
            format!("{sql};")
        };
    }

    let opts = &schema.options;
    let inherited = TableCharset::of(opts, default_charset);
    let mut lines: Vec<String> = schema
        .columns
        .iter()
        .map(|c| format!(" {}", column_definition(c, ColumnStyle::ShowCreate, inherited)))
        .collect();
    let mut keys: Vec<&IndexDef> = schema.indexes.iter().collect();
    keys.sort_by_key(|i| i.kind != IndexKind::Primary);
    lines.extend(keys.into_iter().map(|i| format!(" {}", key_line(i))));

    let mut out = format!(
        "CREATE TABLE {} (\n{}\n) ENGINE={}",
        quote_ident(&schema.name),
        lines.join(",\n"),
        opts.engine.as_deref().unwrap_or("InnoDB"),
    );
    if let Some(n) = opts.auto_increment {
        out.push_str(&format!(" AUTO_INCREMENT={n}"));
    }
    out.push_str(" DEFAULT CHARSET=");
    out.push_str(inherited.charset.unwrap_or(default_charset));
    if let Some(collation) = &opts.collation {
        out.push_str(" COLLATE=");
        out.push_str(collation);
    }
    if let Some(comment) = &opts.comment {
        out.push_str(" COMMENT=");
        out.push_str(&quote_string(comment));
    }
    out.push(';');
    out
}

/// `create_table` with the table name qualified by its database, for tables
/// restored outside the record's own database.
///
/// `None` when a verbatim definition does not start with the table name.
pub fn qualified_create_table(schema: &TableSchema, default_charset: &str) -> Option<String> {
    let sql = create_table(schema, default_charset);
    let qualified = format!("CREATE TABLE {}", schema.ident().quoted());
    if sql.starts_with(&qualified) {
        return Some(sql);
    }
    let bare = format!("CREATE TABLE {}", quote_ident(&schema.name));
    let rest = sql.strip_prefix(&bare)?;
    Some(format!("{qualified}{rest}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_create_style_for_nullable_int() {
        let c = ColumnDef::new("id", "int(11)");
        assert_eq!(
            column_definition(&c, ColumnStyle::ShowCreate, TableCharset::default()),
            "`id` int(11) DEFAULT NULL"
        );
        assert_eq!(column_definition(&c, ColumnStyle::Alter, TableCharset::default()), "`id` int(11)");
    }

    #[test]
    fn not_null_default_and_comment() {
        let c = ColumnDef::new("c1", "int(11)")
            .not_null()
            .default_literal("0")
            .comment("测试列");
        assert_eq!(
            column_definition(&c, ColumnStyle::Alter, TableCharset::default()),
            "`c1` int(11) NOT NULL DEFAULT '0' COMMENT '测试列'"
        );
    }

    #[test]
    fn on_update_column() {
        let c = ColumnDef::new("c1", "datetime")
            .on_update_current_timestamp()
            .comment("123");
        assert_eq!(
            column_definition(&c, ColumnStyle::Alter, TableCharset::default()),
            "`c1` datetime ON UPDATE CURRENT_TIMESTAMP COMMENT '123'"
        );
    }

    #[test]
    fn text_columns_omit_default_null() {
        let c = ColumnDef::new("body", "text");
        assert_eq!(column_definition(&c, ColumnStyle::ShowCreate, TableCharset::default()), "`body` text");
    }

    #[test]
    fn create_table_with_keys_and_options() {
        let mut t = TableSchema::new("db", "t1")
            .with_column(ColumnDef::new("id", "int(11)").auto_increment())
            .with_column(ColumnDef::new("c1", "varchar(20)"))
            .with_index(IndexDef::new("ix_c1", IndexKind::Plain, ["c1"]))
            .with_index(IndexDef::primary(["id"]));
        t.options.charset = Some("utf8".into());
        assert_eq!(
            create_table(&t, "utf8mb4"),
            "CREATE TABLE `t1` (\n `id` int(11) NOT NULL AUTO_INCREMENT,\n `c1` varchar(20) DEFAULT NULL,\n PRIMARY KEY (`id`),\n KEY `ix_c1` (`c1`)\n) ENGINE=InnoDB DEFAULT CHARSET=utf8;"
        );
    }

    #[test]
    fn column_charset_differing_from_table_is_kept() {
        let mut t = TableSchema::new("db", "t1")
            .with_column(ColumnDef::new("name", "varchar(20)").charset("latin1").collate("latin1_bin"))
            .with_column(ColumnDef::new("note", "varchar(20)").charset("utf8mb4"));
        t.options.charset = Some("utf8mb4".into());
        assert_eq!(
            create_table(&t, "utf8"),
            "CREATE TABLE `t1` (\n `name` varchar(20) CHARACTER SET latin1 COLLATE latin1_bin DEFAULT NULL,\n `note` varchar(20) DEFAULT NULL\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;"
        );
    }

    #[test]
    fn alter_definition_keeps_column_collation() {
        let c = ColumnDef::new("code", "char(4)").not_null().collate("utf8mb4_bin");
        let table = TableOptions {
            charset: Some("utf8mb4".into()),
            ..TableOptions::default()
        };
        assert_eq!(
            column_definition(&c, ColumnStyle::Alter, TableCharset::of(&table, "utf8")),
            "`code` char(4) COLLATE utf8mb4_bin NOT NULL"
        );
    }

    #[test]
    fn verbatim_create_sql_wins() {
        let mut t = TableSchema::new("db", "t1");
        t.create_sql = Some("CREATE TABLE `t1` (`id` int)".into());
        assert_eq!(create_table(&t, "utf8"), "CREATE TABLE `t1` (`id` int);");
    }

    #[test]
    fn qualified_create_names_the_database() {
        let t = TableSchema::new("other", "t2").with_column(ColumnDef::new("id", "int(11)"));
        assert_eq!(
            qualified_create_table(&t, "utf8").as_deref(),
            Some("CREATE TABLE `other`.`t2` (\n `id` int(11) DEFAULT NULL\n) ENGINE=InnoDB DEFAULT CHARSET=utf8;")
        );

        let mut verbatim = TableSchema::new("other", "t2");
        verbatim.create_sql = Some("CREATE TABLE `t2` (`id` int)".into());
        assert_eq!(
            qualified_create_table(&verbatim, "utf8").as_deref(),
            Some("CREATE TABLE `other`.`t2` (`id` int);")
        );

        verbatim.create_sql = Some("create table t2 (id int)".into());
        assert_eq!(qualified_create_table(&verbatim, "utf8"), None);
    }
}
