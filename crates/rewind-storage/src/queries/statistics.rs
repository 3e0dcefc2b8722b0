//! Queries for the per-session statistics table.

use rewind_core::errors::StorageError;
use rewind_core::types::{StatCategory, StatisticsCounters};
use rusqlite::{params_from_iter, types::Value as SqlValue, Connection, OptionalExtension};

/// A persisted statistics row.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsRow {
    pub source: String,
    pub session_id: i64,
    pub recorded_at: i64,
    pub counters: StatisticsCounters,
}

fn counter_columns() -> String {
    StatCategory::ALL
        .iter()
        .map(|c| c.column_name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Insert or replace the statistics row of a session.
pub fn upsert_statistics(
    conn: &Connection,
    source: &str,
    session_id: u64,
    counters: &StatisticsCounters,
    recorded_at: i64,
) -> Result<(), StorageError> {
    let placeholders = (1..=StatCategory::ALL.len() + 3)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT OR REPLACE INTO statistics (source, session_id, recorded_at, {})
         VALUES ({placeholders})",
        counter_columns()
    );

    let mut values: Vec<SqlValue> = vec![
        SqlValue::Text(source.to_string()),
        SqlValue::Integer(session_id as i64),
        SqlValue::Integer(recorded_at),
    ];
    values.extend(counters.iter().map(|(_, n)| SqlValue::Integer(n as i64)));

    conn.execute(&sql, params_from_iter(values))
        .map_err(|e| StorageError::SqliteError {
            message: e.to_string(),
        })?;
    Ok(())
}

/// Statistics row of one session.
pub fn get_statistics(
    conn: &Connection,
    source: &str,
    session_id: u64,
) -> Result<Option<StatisticsRow>, StorageError> {
    let sql = format!(
        "SELECT source, session_id, recorded_at, {} FROM statistics
         WHERE source = ?1 AND session_id = ?2",
        counter_columns()
    );
    conn.query_row(&sql, rusqlite::params![source, session_id as i64], map_row)
        .optional()
        .map_err(|e| StorageError::SqliteError {
            message: e.to_string(),
        })
}

/// Most recently recorded statistics row for a source.
pub fn latest_statistics(conn: &Connection, source: &str) -> Result<Option<StatisticsRow>, StorageError> {
    let sql = format!(
        "SELECT source, session_id, recorded_at, {} FROM statistics
         WHERE source = ?1 ORDER BY recorded_at DESC, session_id DESC LIMIT 1",
        counter_columns()
    );
    conn.query_row(&sql, rusqlite::params![source], map_row)
        .optional()
        .map_err(|e| StorageError::SqliteError {
            message: e.to_string(),
        })
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StatisticsRow> {
    let mut counters = StatisticsCounters::new();
    for (i, category) in StatCategory::ALL.iter().enumerate() {
        let n: i64 = row.get(3 + i)?;
        counters.set(*category, n as u64);
    }
    Ok(StatisticsRow {
        source: row.get(0)?,
        session_id: row.get(1)?,
        recorded_at: row.get(2)?,
        counters,
    })
}
