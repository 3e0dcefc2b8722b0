//! Read-back queries and row decoding.

use rewind_core::errors::{CaptureError, CodecError};
use rewind_core::types::{quote_ident, RawCell, RollbackIssue, RowImage, TableSchema};

use crate::codec::{decode_as, CellOrigin};

/// `` `a`,`b`,`c` `` in declared order.
pub fn column_list(schema: &TableSchema) -> String {
    schema
        .columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(",")
}

/// Clauses narrowing a read-back SELECT.
#[derive(Debug, Clone, Default)]
pub struct SelectScope<'a> {
    pub predicate: Option<&'a str>,
    pub order_by: Option<&'a str>,
    pub limit: Option<u64>,
}

/// `SELECT cols[, (extra)...] FROM t [WHERE ..] [ORDER BY ..] [LIMIT n]`.
pub fn select_sql(schema: &TableSchema, extra: &[String], scope: &SelectScope<'_>) -> String {
    let mut sql = format!("SELECT {}", column_list(schema));
    for expr in extra {
        sql.push_str(&format!(",({expr})"));
    }
    sql.push_str(&format!(" FROM {}", schema.ident().quoted()));
    if let Some(p) = scope.predicate {
        sql.push_str(&format!(" WHERE {p}"));
    }
    if let Some(o) = scope.order_by {
        sql.push_str(&format!(" ORDER BY {o}"));
    }
    if let Some(n) = scope.limit {
        sql.push_str(&format!(" LIMIT {n}"));
    }
    sql
}

/// Statement limit clamped to one row past the capture bound, so an
/// oversized result is detected without reading all of it.
pub fn bounded_limit(statement_limit: Option<u64>, max_rows: usize) -> u64 {
    let cap = max_rows as u64 + 1;
    statement_limit.map_or(cap, |l| l.min(cap))
}

pub fn check_row_limit(schema: &TableSchema, rows: usize, limit: usize) -> Result<(), CaptureError> {
    if rows > limit {
        return Err(CaptureError::RowLimitExceeded {
            table: schema.ident().to_string(),
            rows,
            limit,
        });
    }
    Ok(())
}

/// Rows decoded from one query, with issues for rows that could not be.
#[derive(Debug, Default)]
pub struct DecodedRows {
    pub rows: Vec<RowImage>,
    pub issues: Vec<RollbackIssue>,
}

/// Decode the leading `schema.columns.len()` cells of every row.
///
/// A row failing to decode is dropped and reported as an issue; a row with
/// too few cells fails the whole capture.
pub fn decode_rows(schema: &TableSchema, raw: &[Vec<RawCell>]) -> Result<DecodedRows, CaptureError> {
    let mut out = DecodedRows::default();
    for cells in raw {
        match decode_row(schema, cells)? {
            Ok(row) => out.rows.push(row),
            Err(e) => out.issues.push(codec_issue(e)),
        }
    }
    Ok(out)
}

/// Decode one server row. The outer error is a shape mismatch, the inner
/// one a codec failure confined to this row.
pub fn decode_row(
    schema: &TableSchema,
    cells: &[RawCell],
) -> Result<Result<RowImage, CodecError>, CaptureError> {
    let width = schema.columns.len();
    if cells.len() < width {
        return Err(CaptureError::RowShape {
            table: schema.ident().to_string(),
            expected: width,
            actual: cells.len(),
        });
    }
    let values = schema
        .columns
        .iter()
        .zip(cells)
        .map(|(column, cell)| decode_as(column, cell, CellOrigin::Server))
        .collect::<Result<Vec<_>, _>>();
    Ok(values.map(RowImage::new))
}

/// Codec failure recorded against a rollback block.
pub fn codec_issue(err: CodecError) -> RollbackIssue {
    match err {
        CodecError::UnsupportedType {
            column,
            column_type,
        } => RollbackIssue::CodecUnsupportedType {
            column,
            column_type,
        },
        CodecError::InvalidValue { column, detail, .. } => {
            RollbackIssue::CodecInvalidValue { column, detail }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_core::types::ColumnDef;

    fn t1() -> TableSchema {
        TableSchema::new("db", "t1")
            .with_column(ColumnDef::new("id", "int"))
            .with_column(ColumnDef::new("c1", "varchar(10)"))
    }

    #[test]
    fn select_with_projection_and_scope() {
        let scope = SelectScope {
            predicate: Some("id > 1"),
            order_by: Some("id"),
            limit: Some(5),
        };
        assert_eq!(
            select_sql(&t1(), &["id+2".to_string()], &scope),
            "SELECT `id`,`c1`,(id+2) FROM `db`.`t1` WHERE id > 1 ORDER BY id LIMIT 5"
        );
    }

    #[test]
    fn limit_is_clamped_one_past_the_cap() {
        assert_eq!(bounded_limit(None, 100), 101);
        assert_eq!(bounded_limit(Some(3), 100), 3);
        assert_eq!(bounded_limit(Some(1000), 100), 101);
    }

    #[test]
    fn short_rows_are_rejected() {
        let raw = vec![vec![Some(b"1".to_vec())]];
        assert!(matches!(
            decode_rows(&t1(), &raw),
            Err(CaptureError::RowShape { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn bad_cells_become_issues() {
        let raw = vec![
            vec![Some(b"x".to_vec()), None],
            vec![Some(b"2".to_vec()), Some(b"b".to_vec())],
        ];
        let decoded = decode_rows(&t1(), &raw).unwrap();
        assert_eq!(decoded.rows.len(), 1);
        assert!(matches!(
            decoded.issues[0],
            RollbackIssue::CodecInvalidValue { .. }
        ));
    }
}
