//! DELETE capture: before images read ahead of execution.

use rewind_core::errors::CaptureError;
use rewind_core::traits::{ExecOutcome, ExecutionProvider};
use rewind_core::types::{DeleteStatement, RollbackBlock, RollbackIssue, TableSchema};

use super::select::{bounded_limit, check_row_limit, decode_rows, select_sql, DecodedRows, SelectScope};
use super::CaptureOptions;
use crate::rollback::insert_for_deleted;

/// Read the rows the DELETE is about to remove, in server order.
pub fn before(
    exec: &mut dyn ExecutionProvider,
    schema: &TableSchema,
    stmt: &DeleteStatement,
    opts: &CaptureOptions,
) -> Result<DecodedRows, CaptureError> {
    let scope = SelectScope {
        predicate: stmt.predicate.as_deref(),
        order_by: stmt.order_by.as_deref(),
        limit: Some(bounded_limit(stmt.limit, opts.max_rows)),
    };
    let raw = exec.query(&select_sql(schema, &[], &scope))?;
    check_row_limit(schema, raw.len(), opts.max_rows)?;
    let decoded = decode_rows(schema, &raw)?;
    tracing::debug!(
        table = %schema.ident(),
        rows = decoded.rows.len(),
        "captured rows before delete"
    );
    Ok(decoded)
}

/// INSERT statements restoring the deleted rows in capture order.
pub fn rollback(schema: &TableSchema, captured: DecodedRows, outcome: &ExecOutcome) -> RollbackBlock {
    let mut block = RollbackBlock::new();
    let captured_rows = captured.rows.len() + captured.issues.len();
    captured.issues.into_iter().for_each(|i| block.flag(i));

    if outcome.affected_rows != captured_rows as u64 {
        block.flag(RollbackIssue::CaptureInconsistency {
            row: None,
            detail: format!(
                "captured {captured_rows} rows but server deleted {}",
                outcome.affected_rows
            ),
        });
    }

    for (idx, row) in captured.rows.iter().enumerate() {
        match insert_for_deleted(schema, row) {
            Ok(sql) => block.push(sql),
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
