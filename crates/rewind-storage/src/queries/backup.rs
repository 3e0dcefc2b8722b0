//! Queries for backup_operations and the per-table rollback tables.

use rewind_core::errors::StorageError;
use rewind_core::types::{BackupLocation, OperationRecord, SqlText};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};

/// A row of the backup information table.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupOperationRow {
    pub opid: String,
    pub session_id: i64,
    pub sequence: i64,
    pub backup_db: String,
    pub table_name: String,
    pub source_schema: String,
    pub sql_statement: String,
    pub kind: String,
    pub affected_rows: i64,
    pub statement_count: i64,
    pub incomplete: bool,
    pub issues: Vec<String>,
    pub created_at: i64,
}

/// Name of the SQLite table holding rollback statements for `location`.
pub fn store_table_name(location: &BackupLocation) -> String {
    format!("{}.{}", location.database, location.table)
}

fn quote_sqlite(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sqlite_err(e: rusqlite::Error) -> StorageError {
    StorageError::SqliteError {
        message: e.to_string(),
    }
}

/// Create the rollback table for `location` if needed and register it.
pub fn ensure_backup_table(
    conn: &Connection,
    location: &BackupLocation,
    now: i64,
) -> Result<String, StorageError> {
    let store_table = store_table_name(location);
    let quoted = quote_sqlite(&store_table);
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {quoted} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            opid TEXT NOT NULL,
            rollback_statement TEXT NOT NULL
        ) STRICT;
        CREATE INDEX IF NOT EXISTS {idx} ON {quoted}(opid);",
        idx = quote_sqlite(&format!("idx_{store_table}_opid")),
    ))
    .map_err(sqlite_err)?;

    conn.execute(
        "INSERT OR IGNORE INTO backup_tables (backup_db, table_name, store_table, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![location.database, location.table, store_table, now],
    )
    .map_err(sqlite_err)?;

    Ok(store_table)
}

/// Insert the information row for one operation.
pub fn insert_operation(
    conn: &Connection,
    location: &BackupLocation,
    record: &OperationRecord,
    now: i64,
) -> Result<(), StorageError> {
    let issues: Vec<String> = record.rollback.issues.iter().map(|i| i.to_string()).collect();
    let issues_json = if issues.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&issues).map_err(|e| StorageError::SqliteError {
            message: format!("failed to encode issues: {e}"),
        })?)
    };

    conn.prepare_cached(
        "INSERT INTO backup_operations (
            opid, session_id, sequence, backup_db, table_name, source_schema,
            sql_statement, kind, affected_rows, statement_count, incomplete, issues, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )
    .and_then(|mut stmt| {
        stmt.execute(params![
            record.op_id.to_string(),
            record.op_id.session_id as i64,
            record.sequence,
            location.database,
            location.table,
            record.table.schema,
            record.sql,
            record.kind.name(),
            record.affected_rows as i64,
            record.rollback.len() as i64,
            record.is_incomplete(),
            issues_json,
            now,
        ])
    })
    .map_err(sqlite_err)?;
    Ok(())
}

/// Append the rollback statements of one operation to its table.
pub fn insert_rollback_statements(
    conn: &Connection,
    store_table: &str,
    record: &OperationRecord,
) -> Result<usize, StorageError> {
    let sql = format!(
        "INSERT INTO {} (opid, rollback_statement) VALUES (?1, ?2)",
        quote_sqlite(store_table)
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(sqlite_err)?;
    let opid = record.op_id.to_string();
    for statement in &record.rollback.statements {
        // Bound as TEXT byte for byte; binary literals need not be UTF-8.
        let text = ToSqlOutput::Borrowed(ValueRef::Text(statement.as_bytes()));
        stmt.execute(params![opid, text]).map_err(sqlite_err)?;
    }
    Ok(record.rollback.statements.len())
}

/// Look up the information row for an opid.
pub fn get_operation(conn: &Connection, opid: &str) -> Result<Option<BackupOperationRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT opid, session_id, sequence, backup_db, table_name, source_schema,
                    sql_statement, kind, affected_rows, statement_count, incomplete, issues,
                    created_at
             FROM backup_operations WHERE opid = ?1",
        )
        .map_err(sqlite_err)?;
    stmt.query_row(params![opid], map_operation_row)
        .optional()
        .map_err(sqlite_err)
}

/// Operations of one backup table in descending opid order, newest first.
pub fn operations_for_table(
    conn: &Connection,
    location: &BackupLocation,
) -> Result<Vec<BackupOperationRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT opid, session_id, sequence, backup_db, table_name, source_schema,
                    sql_statement, kind, affected_rows, statement_count, incomplete, issues,
                    created_at
             FROM backup_operations WHERE backup_db = ?1 AND table_name = ?2
             ORDER BY opid DESC",
        )
        .map_err(sqlite_err)?;
    let rows = stmt
        .query_map(params![location.database, location.table], map_operation_row)
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
}

/// Operations of one session in statement order.
pub fn operations_for_session(
    conn: &Connection,
    session_id: u64,
) -> Result<Vec<BackupOperationRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT opid, session_id, sequence, backup_db, table_name, source_schema,
                    sql_statement, kind, affected_rows, statement_count, incomplete, issues,
                    created_at
             FROM backup_operations WHERE session_id = ?1 ORDER BY sequence",
        )
        .map_err(sqlite_err)?;
    let rows = stmt
        .query_map(params![session_id as i64], map_operation_row)
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
}

/// Rollback statements stored for an opid, in generation order.
pub fn rollback_statements(conn: &Connection, opid: &str) -> Result<Vec<SqlText>, StorageError> {
    let Some(op) = get_operation(conn, opid)? else {
        return Ok(Vec::new());
    };
    let location = BackupLocation {
        database: op.backup_db,
        table: op.table_name,
    };
    let sql = format!(
        "SELECT rollback_statement FROM {} WHERE opid = ?1 ORDER BY id",
        quote_sqlite(&store_table_name(&location))
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(sqlite_err)?;
    let rows = stmt
        .query_map(params![opid], |row| match row.get_ref(0)? {
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Ok(SqlText::from_bytes(bytes.to_vec())),
            other => Err(rusqlite::Error::InvalidColumnType(
                0,
                "rollback_statement".into(),
                other.data_type(),
            )),
        })
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
}

/// Registered backup locations.
pub fn list_backup_tables(conn: &Connection) -> Result<Vec<BackupLocation>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT backup_db, table_name FROM backup_tables ORDER BY backup_db, table_name")
        .map_err(sqlite_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(BackupLocation {
                database: row.get(0)?,
                table: row.get(1)?,
            })
        })
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
}

/// Count information rows.
pub fn count_operations(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM backup_operations", [], |row| row.get(0))
        .map_err(sqlite_err)
}

fn map_operation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BackupOperationRow> {
    let issues: Option<String> = row.get(11)?;
    Ok(BackupOperationRow {
        opid: row.get(0)?,
        session_id: row.get(1)?,
        sequence: row.get(2)?,
        backup_db: row.get(3)?,
        table_name: row.get(4)?,
        source_schema: row.get(5)?,
        sql_statement: row.get(6)?,
        kind: row.get(7)?,
        affected_rows: row.get(8)?,
        statement_count: row.get(9)?,
        incomplete: row.get(10)?,
        issues: issues
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
        created_at: row.get(12)?,
    })
}
