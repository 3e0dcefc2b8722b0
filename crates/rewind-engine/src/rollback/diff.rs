//! UPDATE inverses with optional minimal column diff.

use rewind_core::types::{quote_ident, RollbackIssue, RowImage, SqlText, TableSchema, Value};

use super::predicate::{equality_predicate, full_row_predicate};
use crate::codec::render;

/// Per-column comparison of one updated row.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDiff<'a> {
    pub column: &'a str,
    pub position: usize,
    pub before: &'a Value,
    pub after: Option<&'a Value>,
    pub changed: bool,
}

/// Column diffs in declared order. Generated columns are excluded.
pub fn column_diffs<'a>(
    schema: &'a TableSchema,
    before: &'a RowImage,
    after: &'a RowImage,
) -> Result<Vec<ColumnDiff<'a>>, RollbackIssue> {
    schema
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_generated())
        .map(|(pos, c)| {
            let before_value = before.get(pos).ok_or_else(|| RollbackIssue::CaptureInconsistency {
                row: None,
                detail: format!("before value of `{}` was not captured", c.name),
            })?;
            let after_value = after.get(pos);
            Ok(ColumnDiff {
                column: &c.name,
                position: pos,
                before: before_value,
                after: after_value,
                changed: after_value != Some(before_value),
            })
        })
        .collect()
}

/// UPDATE restoring `before` over the row now holding `after`.
///
/// Full mode restores every column and pins every column of the after image.
/// Minimal mode restores only changed columns and pins the primary key when
/// the table has one. Rows without changes yield `Ok(None)`.
pub fn update_for_updated(
    schema: &TableSchema,
    before: &RowImage,
    after: &RowImage,
    minimal: bool,
) -> Result<Option<SqlText>, RollbackIssue> {
    let diffs = column_diffs(schema, before, after)?;
    if diffs.iter().all(|d| !d.changed) {
        return Ok(None);
    }

    let assignments: Vec<SqlText> = diffs
        .iter()
        .filter(|d| !minimal || d.changed)
        .map(|d| {
            let mut term = SqlText::from(format!("{}=", quote_ident(d.column)));
            term.push_sql(&render(d.before));
            term
        })
        .collect();

    let pinned = match schema.primary_key_columns() {
        Some(pk) if minimal => equality_predicate(schema, after, &pk),
        _ => full_row_predicate(schema, after),
    };
    let predicate = pinned.ok_or_else(|| RollbackIssue::CaptureInconsistency {
        row: None,
        detail: "no after value available to locate the updated row".into(),
    })?;

    let mut sql = SqlText::from(format!("UPDATE {} SET ", schema.ident().quoted()));
    sql.push_sql(&SqlText::join(&assignments, ", "));
    sql.push_str(" WHERE ");
    sql.push_sql(&predicate);
    sql.push_str(";");
    Ok(Some(sql))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_core::types::{ColumnDef, IndexDef};

    fn keyed() -> TableSchema {
        TableSchema::new("test_inc", "t1")
            .with_column(ColumnDef::new("id", "int(11)").not_null())
            .with_column(ColumnDef::new("c1", "int(11)"))
            .with_index(IndexDef::primary(["id"]))
    }

    fn row(id: i64, c1: i64) -> RowImage {
        RowImage::new(vec![Value::Int(id), Value::Int(c1)])
    }

    #[test]
    fn minimal_sets_only_changed_columns() {
        let sql = update_for_updated(&keyed(), &row(1, 1), &row(1, 10), true)
            .unwrap()
            .unwrap();
        assert_eq!(sql, "UPDATE `test_inc`.`t1` SET `c1`=1 WHERE `id`=1;");
    }

    #[test]
    fn minimal_moved_key_uses_new_key() {
        let sql = update_for_updated(&keyed(), &row(1, 1), &row(3, 1), true)
            .unwrap()
            .unwrap();
        assert_eq!(sql, "UPDATE `test_inc`.`t1` SET `id`=1 WHERE `id`=3;");
    }

    #[test]
    fn full_mode_restores_and_pins_everything() {
        let sql = update_for_updated(&keyed(), &row(1, 1), &row(1, 10), false)
            .unwrap()
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE `test_inc`.`t1` SET `id`=1, `c1`=1 WHERE `id`=1 AND `c1`=10;"
        );
    }

    #[test]
    fn unchanged_row_yields_nothing() {
        assert_eq!(
            update_for_updated(&keyed(), &row(1, 1), &row(1, 1), true).unwrap(),
            None
        );
        assert_eq!(
            update_for_updated(&keyed(), &row(1, 1), &row(1, 1), false).unwrap(),
            None
        );
    }

    #[test]
    fn diffs_skip_generated_columns() {
        let schema = keyed().with_column(ColumnDef::new("g", "int").generated("c1+1"));
        let before = RowImage::new(vec![Value::Int(1), Value::Int(1), Value::Int(2)]);
        let after = RowImage::new(vec![Value::Int(1), Value::Int(5), Value::Int(6)]);
        let diffs = column_diffs(&schema, &before, &after).unwrap();
        assert_eq!(diffs.len(), 2);
        assert!(diffs[1].changed);
    }
}
