//! INSERT capture: after images projected from the submitted rows.

use rewind_core::errors::CaptureError;
use rewind_core::traits::{ExecOutcome, ExecutionProvider};
use rewind_core::types::{
    ColumnDef, ColumnDefault, InsertSource, InsertStatement, InsertValue, RollbackBlock,
    RollbackIssue, RowImage, TableSchema, Value,
};

use super::select::{check_row_limit, codec_issue};
use super::CaptureOptions;
use crate::codec::{decode_as, CellOrigin};
use crate::rollback::delete_for_inserted;

/// One projected cell: known, waiting for an auto-increment id, or unknown.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Known(Value),
    AutoIncrement,
    Unknown,
}

/// Rows an INSERT is about to write, projected before execution.
#[derive(Debug)]
pub struct PendingInsert {
    rows: Vec<Vec<Cell>>,
    issues: Vec<RollbackIssue>,
    ignore: bool,
}

impl PendingInsert {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Project the rows of an INSERT. `INSERT ... SELECT` runs its SELECT here,
/// before the statement changes anything.
pub fn before(
    exec: &mut dyn ExecutionProvider,
    schema: &TableSchema,
    stmt: &InsertStatement,
    opts: &CaptureOptions,
) -> Result<PendingInsert, CaptureError> {
    let targets = target_positions(schema, &stmt.columns)?;
    let mut pending = PendingInsert {
        rows: Vec::new(),
        issues: Vec::new(),
        ignore: stmt.ignore,
    };

    match &stmt.source {
        InsertSource::Values(rows) => {
            check_row_limit(schema, rows.len(), opts.max_rows)?;
            for values in rows {
                check_width(schema, targets.len(), values.len())?;
                let supplied: Vec<(usize, Cell)> = targets
                    .iter()
                    .zip(values)
                    .map(|(&pos, v)| (pos, literal_cell(&schema.columns[pos], v, opts, &mut pending.issues)))
                    .collect();
                pending.rows.push(project_row(schema, supplied, opts));
            }
        }
        InsertSource::Select(select) => {
            let raw = exec.query(select)?;
            check_row_limit(schema, raw.len(), opts.max_rows)?;
            for cells in &raw {
                check_width(schema, targets.len(), cells.len())?;
                let supplied: Vec<(usize, Cell)> = targets
                    .iter()
                    .zip(cells)
                    .map(|(&pos, cell)| {
                        let column = &schema.columns[pos];
                        let value = match decode_as(column, cell, CellOrigin::Server) {
                            Ok(Value::Null) if column.auto_increment => Cell::AutoIncrement,
                            Ok(v) => Cell::Known(v),
                            Err(e) => {
                                pending.issues.push(codec_issue(e));
                                Cell::Unknown
                            }
                        };
                        (pos, value)
                    })
                    .collect();
                pending.rows.push(project_row(schema, supplied, opts));
            }
        }
    }

    tracing::debug!(
        table = %schema.ident(),
        rows = pending.row_count(),
        "projected insert rows"
    );
    Ok(pending)
}

/// DELETE statements for every inserted row, once the server reported
/// the outcome.
pub fn rollback(schema: &TableSchema, pending: PendingInsert, outcome: &ExecOutcome) -> RollbackBlock {
    let mut block = RollbackBlock::new();
    let submitted = pending.row_count() as u64;
    pending.issues.into_iter().for_each(|i| block.flag(i));

    if outcome.affected_rows != submitted {
        let detail = if pending.ignore {
            format!(
                "{} of {submitted} rows inserted, ignored rows cannot be told apart",
                outcome.affected_rows
            )
        } else {
            format!(
                "server reported {} affected rows for {submitted} submitted rows",
                outcome.affected_rows
            )
        };
        block.flag(RollbackIssue::CaptureInconsistency { row: None, detail });
        return block;
    }

    let mut next_id = outcome.last_insert_id;
    for (idx, cells) in pending.rows.into_iter().enumerate() {
        let values = cells
            .into_iter()
            .map(|cell| match cell {
                Cell::Known(v) => Some(v),
                Cell::AutoIncrement if next_id > 0 => {
                    let id = next_id;
                    next_id += 1;
                    Some(Value::UInt(id))
                }
                Cell::AutoIncrement | Cell::Unknown => None,
            })
            .collect();
        match delete_for_inserted(schema, &RowImage::with_unknowns(values)) {
            Ok(sql) => block.push(sql),
            Err(issue) => block.flag(at_row(issue, idx)),
        }
    }
    block
}

fn at_row(issue: RollbackIssue, idx: usize) -> RollbackIssue {
    match issue {
        RollbackIssue::CaptureInconsistency { detail, .. } => RollbackIssue::CaptureInconsistency {
            row: Some(idx),
            detail,
        },
        other => other,
    }
}

fn target_positions(schema: &TableSchema, columns: &[String]) -> Result<Vec<usize>, CaptureError> {
    if columns.is_empty() {
        return Ok((0..schema.columns.len()).collect());
    }
    columns
        .iter()
        .map(|name| {
            schema
                .column_index(name)
                .ok_or_else(|| CaptureError::Inconsistency {
                    table: schema.ident().to_string(),
                    detail: format!("column `{name}` not in table definition"),
                })
        })
        .collect()
}

fn check_width(schema: &TableSchema, expected: usize, actual: usize) -> Result<(), CaptureError> {
    if expected != actual {
        return Err(CaptureError::RowShape {
            table: schema.ident().to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn literal_cell(
    column: &ColumnDef,
    value: &InsertValue,
    opts: &CaptureOptions,
    issues: &mut Vec<RollbackIssue>,
) -> Cell {
    match value {
        InsertValue::Default => default_cell(column, opts),
        InsertValue::Expression(_) => Cell::Unknown,
        InsertValue::Null if column.auto_increment => Cell::AutoIncrement,
        InsertValue::Null if column.is_timestamp() && !column.nullable && !opts.explicit_defaults_for_timestamp => {
            Cell::Unknown
        }
        InsertValue::Null => Cell::Known(Value::Null),
        InsertValue::Literal(bytes) => match decode_as(column, &Some(bytes.clone()), CellOrigin::Literal) {
            Ok(Value::Int(0)) | Ok(Value::UInt(0)) if column.auto_increment => Cell::AutoIncrement,
            Ok(v) => Cell::Known(v),
            Err(e) => {
                issues.push(codec_issue(e));
                Cell::Unknown
            }
        },
    }
}

/// Value the server fills in when the column is omitted or set to DEFAULT.
fn default_cell(column: &ColumnDef, opts: &CaptureOptions) -> Cell {
    if column.is_generated() {
        return Cell::Unknown;
    }
    if column.auto_increment {
        return Cell::AutoIncrement;
    }
    match &column.default {
        ColumnDefault::Literal(text) => {
            match decode_as(column, &Some(text.as_bytes().to_vec()), CellOrigin::Literal) {
                Ok(v) => Cell::Known(v),
                Err(_) => Cell::Unknown,
            }
        }
        ColumnDefault::Expression(_) => Cell::Unknown,
        ColumnDefault::Null => Cell::Known(Value::Null),
        ColumnDefault::None if column.is_timestamp() && !opts.explicit_defaults_for_timestamp => {
            Cell::Unknown
        }
        ColumnDefault::None if column.nullable => Cell::Known(Value::Null),
        // Implicit zero value of a NOT NULL column depends on the sql_mode.
        ColumnDefault::None => Cell::Unknown,
    }
}

fn project_row(schema: &TableSchema, supplied: Vec<(usize, Cell)>, opts: &CaptureOptions) -> Vec<Cell> {
    let mut row: Vec<Option<Cell>> = vec![None; schema.columns.len()];
    for (pos, cell) in supplied {
        row[pos] = Some(cell);
    }
    row.into_iter()
        .zip(&schema.columns)
        .map(|(cell, column)| match cell {
            Some(_) if column.is_generated() => Cell::Unknown,
            Some(cell) => cell,
            None => default_cell(column, opts),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_core::types::{IndexDef, TableName};

    struct NoQuery;

    impl ExecutionProvider for NoQuery {
        fn execute(&mut self, _sql: &str) -> Result<ExecOutcome, rewind_core::errors::ProviderError> {
            Ok(ExecOutcome::default())
        }

        fn query(
            &mut self,
            _sql: &str,
        ) -> Result<Vec<Vec<rewind_core::types::RawCell>>, rewind_core::errors::ProviderError> {
            Ok(Vec::new())
        }
    }

    fn opts() -> CaptureOptions {
        CaptureOptions {
            max_rows: 100,
            explicit_defaults_for_timestamp: true,
            minimal_update: false,
        }
    }

    fn auto_table() -> TableSchema {
        TableSchema::new("db", "t1")
            .with_column(ColumnDef::new("id", "int(11)").auto_increment())
            .with_column(ColumnDef::new("c1", "varchar(10)"))
            .with_index(IndexDef::primary(["id"]))
    }

    fn insert(columns: &[&str], rows: Vec<Vec<InsertValue>>) -> InsertStatement {
        InsertStatement {
            table: TableName::new("t1"),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            source: InsertSource::Values(rows),
            ignore: false,
        }
    }

    #[test]
    fn auto_increment_ids_are_consecutive() {
        let stmt = insert(
            &["c1"],
            vec![vec![InsertValue::text("a")], vec![InsertValue::text("b")]],
        );
        let pending = before(&mut NoQuery, &auto_table(), &stmt, &opts()).unwrap();
        let outcome = ExecOutcome {
            affected_rows: 2,
            last_insert_id: 7,
        };
        let block = rollback(&auto_table(), pending, &outcome);
        assert_eq!(
            block.statements,
            vec![
                "DELETE FROM `db`.`t1` WHERE `id`=7;",
                "DELETE FROM `db`.`t1` WHERE `id`=8;",
            ]
        );
    }

    #[test]
    fn wrong_width_is_a_shape_error() {
        let stmt = insert(&[], vec![vec![InsertValue::text("1")]]);
        assert!(matches!(
            before(&mut NoQuery, &auto_table(), &stmt, &opts()),
            Err(CaptureError::RowShape { .. })
        ));
    }

    #[test]
    fn ignored_rows_leave_block_incomplete() {
        let mut stmt = insert(
            &[],
            vec![
                vec![InsertValue::text("1"), InsertValue::text("a")],
                vec![InsertValue::text("2"), InsertValue::text("b")],
            ],
        );
        stmt.ignore = true;
        let pending = before(&mut NoQuery, &auto_table(), &stmt, &opts()).unwrap();
        let outcome = ExecOutcome {
            affected_rows: 1,
            last_insert_id: 0,
        };
        let block = rollback(&auto_table(), pending, &outcome);
        assert!(block.is_empty());
        assert!(!block.is_complete());
    }

    #[test]
    fn expression_key_is_unknown() {
        let schema = TableSchema::new("db", "t2")
            .with_column(ColumnDef::new("id", "varchar(36)").not_null())
            .with_index(IndexDef::primary(["id"]));
        let stmt = insert(&[], vec![vec![InsertValue::Expression("uuid()".into())]]);
        let pending = before(&mut NoQuery, &schema, &stmt, &opts()).unwrap();
        let outcome = ExecOutcome {
            affected_rows: 1,
            last_insert_id: 0,
        };
        let block = rollback(&schema, pending, &outcome);
        assert_eq!(
            block.issues,
            vec![RollbackIssue::CaptureInconsistency {
                row: Some(0),
                detail: "key value of inserted row is computed by the server and unknown".into(),
            }]
        );
    }

    #[test]
    fn omitted_columns_take_their_defaults() {
        let schema = TableSchema::new("db", "t3")
            .with_column(ColumnDef::new("id", "int(11)"))
            .with_column(ColumnDef::new("c1", "varchar(10)").default_null())
            .with_column(ColumnDef::new("c2", "datetime").default_expression("CURRENT_TIMESTAMP"))
            .with_column(ColumnDef::new("c3", "int(11)").default_literal("5"));
        let stmt = insert(&["id"], vec![vec![InsertValue::text("1")]]);
        let pending = before(&mut NoQuery, &schema, &stmt, &opts()).unwrap();
        assert_eq!(pending.row_count(), 1);
        let outcome = ExecOutcome {
            affected_rows: 1,
            last_insert_id: 0,
        };
        let block = rollback(&schema, pending, &outcome);
        assert_eq!(
            block.statements,
            vec!["DELETE FROM `db`.`t3` WHERE `id`=1 AND `c1` IS NULL AND `c3`=5;"]
        );
        assert!(block.is_complete());
    }
}
