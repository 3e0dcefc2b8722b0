//! UPDATE capture: before images with projected assignments, then a
//! read-back of every row by its post-update key.

use rewind_core::errors::CaptureError;
use rewind_core::traits::ExecutionProvider;
use rewind_core::types::{
    RollbackBlock, RollbackIssue, RowImage, TableSchema, UpdateStatement,
};

use super::select::{
    bounded_limit, check_row_limit, codec_issue, decode_row, select_sql, SelectScope,
};
use super::CaptureOptions;
use crate::codec::{decode_as, CellOrigin};
use crate::rollback::predicate::key_query_predicate;
use crate::rollback::update_for_updated;

/// One matched row: its value now and its expected value after the update.
#[derive(Debug, Clone)]
pub struct UpdatedRow {
    pub before: RowImage,
    pub projected: RowImage,
}

/// Rows matched by an UPDATE, captured before execution.
#[derive(Debug, Default)]
pub struct PendingUpdate {
    pub rows: Vec<UpdatedRow>,
    pub issues: Vec<RollbackIssue>,
}

/// Read the matched rows together with every assignment evaluated against
/// them: `SELECT cols, (expr1), (expr2) FROM t WHERE ...`.
///
/// Assignments are evaluated against pre-update values, so an assignment
/// reading a column assigned earlier in the same SET is projected from the
/// old value.
pub fn before(
    exec: &mut dyn ExecutionProvider,
    schema: &TableSchema,
    stmt: &UpdateStatement,
    opts: &CaptureOptions,
) -> Result<PendingUpdate, CaptureError> {
    let targets = stmt
        .assignments
        .iter()
        .map(|a| {
            schema
                .column_index(&a.column)
                .ok_or_else(|| CaptureError::Inconsistency {
                    table: schema.ident().to_string(),
                    detail: format!("assigned column `{}` not in table definition", a.column),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let exprs: Vec<String> = stmt.assignments.iter().map(|a| a.expression.clone()).collect();

    let scope = SelectScope {
        predicate: stmt.predicate.as_deref(),
        order_by: stmt.order_by.as_deref(),
        limit: Some(bounded_limit(stmt.limit, opts.max_rows)),
    };
    let raw = exec.query(&select_sql(schema, &exprs, &scope))?;
    check_row_limit(schema, raw.len(), opts.max_rows)?;

    let width = schema.columns.len();
    let mut pending = PendingUpdate::default();
    for cells in &raw {
        let before = match decode_row(schema, cells)? {
            Ok(row) => row,
            Err(e) => {
                pending.issues.push(codec_issue(e));
                continue;
            }
        };
        let mut projected = before.clone();
        for (k, &pos) in targets.iter().enumerate() {
            let Some(cell) = cells.get(width + k) else {
                projected.forget(pos);
                continue;
            };
            match decode_as(&schema.columns[pos], cell, CellOrigin::Server) {
                Ok(v) => projected.set(pos, v),
                Err(e) => {
                    projected.forget(pos);
                    pending.issues.push(codec_issue(e));
                }
            }
        }
        for (pos, column) in schema.columns.iter().enumerate() {
            if column.is_generated() || column.on_update_current_timestamp {
                projected.forget(pos);
            }
        }
        pending.rows.push(UpdatedRow { before, projected });
    }

    tracing::debug!(
        table = %schema.ident(),
        rows = pending.rows.len(),
        "captured rows before update"
    );
    Ok(pending)
}

/// Read each row back by its post-update key and build the restoring UPDATEs.
///
/// Tables without a usable key take the projected image as the after image.
pub fn rollback(
    exec: &mut dyn ExecutionProvider,
    schema: &TableSchema,
    pending: PendingUpdate,
    opts: &CaptureOptions,
) -> RollbackBlock {
    let mut block = RollbackBlock::new();
    pending.issues.into_iter().for_each(|i| block.flag(i));
    let key = schema.row_key_columns();

    for (idx, row) in pending.rows.into_iter().enumerate() {
        let after = match &key {
            Some(key) => match read_back(exec, schema, &row.projected, key) {
                Ok(after) => after,
                Err(detail) => {
                    block.flag(RollbackIssue::CaptureInconsistency {
                        row: Some(idx),
                        detail,
                    });
                    continue;
                }
            },
            None => row.projected,
        };
        match update_for_updated(schema, &row.before, &after, opts.minimal_update) {
            Ok(Some(sql)) => block.push(sql),
            Ok(None) => {}
            Err(RollbackIssue::CaptureInconsistency { detail, .. }) => {
                block.flag(RollbackIssue::CaptureInconsistency {
                    row: Some(idx),
                    detail,
                })
            }
            Err(other) => block.flag(other),
        }
    }
    block
}

fn read_back(
    exec: &mut dyn ExecutionProvider,
    schema: &TableSchema,
    projected: &RowImage,
    key: &[usize],
) -> Result<RowImage, String> {
    let predicate = key_query_predicate(schema, projected, key)
        .ok_or_else(|| "post-update key value is unknown".to_string())?;
    let scope = SelectScope {
        predicate: Some(&predicate),
        order_by: None,
        limit: Some(2),
    };
    let raw = exec
        .query(&select_sql(schema, &[], &scope))
        .map_err(|e| format!("read-back failed: {e}"))?;
    let cells = match raw.as_slice() {
        [only] => only,
        [] => return Err(format!("row not found after update by {predicate}")),
        _ => return Err(format!("post-update key {predicate} matches several rows")),
    };
    match decode_row(schema, cells) {
        Ok(Ok(row)) => Ok(row),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(e.to_string()),
    }
}
