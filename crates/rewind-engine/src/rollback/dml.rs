//! Row-level inverses for INSERT and DELETE.

use rewind_core::types::{quote_ident, RollbackIssue, RowImage, SqlText, TableSchema};

use super::predicate::{full_row_predicate, key_predicate};
use crate::codec::render;

/// DELETE removing one inserted row.
///
/// Keyed by the primary key, else a NOT NULL unique key, else every known
/// column. Fails when a key exists but one of its values is unknown.
pub fn delete_for_inserted(schema: &TableSchema, row: &RowImage) -> Result<SqlText, RollbackIssue> {
    let predicate = match schema.row_key_columns() {
        Some(key) => key_predicate(schema, row, &key).ok_or_else(|| {
            RollbackIssue::CaptureInconsistency {
                row: None,
                detail: "key value of inserted row is computed by the server and unknown".into(),
            }
        })?,
        None => full_row_predicate(schema, row).ok_or_else(|| RollbackIssue::CaptureInconsistency {
            row: None,
            detail: "no column value of inserted row is known".into(),
        })?,
    };
    let mut sql = SqlText::from(format!("DELETE FROM {} WHERE ", schema.ident().quoted()));
    sql.push_sql(&predicate);
    sql.push_str(";");
    Ok(sql)
}

/// INSERT restoring one deleted row. Generated columns are left to the server.
pub fn insert_for_deleted(schema: &TableSchema, row: &RowImage) -> Result<SqlText, RollbackIssue> {
    let mut names = Vec::with_capacity(schema.columns.len());
    let mut values = Vec::with_capacity(schema.columns.len());
    for (pos, column) in schema.columns.iter().enumerate() {
        if column.is_generated() {
            continue;
        }
        let value = row.get(pos).ok_or_else(|| RollbackIssue::CaptureInconsistency {
            row: None,
            detail: format!("value of `{}` was not captured", column.name),
        })?;
        names.push(quote_ident(&column.name));
        values.push(render(value));
    }
    let mut sql = SqlText::from(format!(
        "INSERT INTO {}({}) VALUES(",
        schema.ident().quoted(),
        names.join(",")
    ));
    sql.push_sql(&SqlText::join(&values, ","));
    sql.push_str(");");
    Ok(sql)
}
