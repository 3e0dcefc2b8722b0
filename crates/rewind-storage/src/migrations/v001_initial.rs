//! V001: Initial schema.
//! backup_operations, backup_tables, statistics.

pub const MIGRATION_SQL: &str = r#"
-- One row per audited statement that produced a rollback block.
CREATE TABLE IF NOT EXISTS backup_operations (
    opid TEXT PRIMARY KEY,
    session_id INTEGER NOT NULL,
    sequence INTEGER NOT NULL,
    backup_db TEXT NOT NULL,
    table_name TEXT NOT NULL,
    source_schema TEXT NOT NULL,
    sql_statement TEXT NOT NULL,
    kind TEXT NOT NULL,
    affected_rows INTEGER NOT NULL DEFAULT 0,
    statement_count INTEGER NOT NULL DEFAULT 0,
    incomplete INTEGER NOT NULL DEFAULT 0,
    issues TEXT,
    created_at INTEGER NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_backup_operations_location
    ON backup_operations(backup_db, table_name);
CREATE INDEX IF NOT EXISTS idx_backup_operations_session
    ON backup_operations(session_id, sequence);

-- Registry of per-table rollback tables created on demand.
CREATE TABLE IF NOT EXISTS backup_tables (
    backup_db TEXT NOT NULL,
    table_name TEXT NOT NULL,
    store_table TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (backup_db, table_name)
) STRICT;

-- One row per session.
CREATE TABLE IF NOT EXISTS statistics (
    source TEXT NOT NULL,
    session_id INTEGER NOT NULL,
    recorded_at INTEGER NOT NULL,
    usedb INTEGER NOT NULL DEFAULT 0,
    deleting INTEGER NOT NULL DEFAULT 0,
    inserting INTEGER NOT NULL DEFAULT 0,
    updating INTEGER NOT NULL DEFAULT 0,
    selecting INTEGER NOT NULL DEFAULT 0,
    altertable INTEGER NOT NULL DEFAULT 0,
    renaming INTEGER NOT NULL DEFAULT 0,
    createindex INTEGER NOT NULL DEFAULT 0,
    dropindex INTEGER NOT NULL DEFAULT 0,
    addcolumn INTEGER NOT NULL DEFAULT 0,
    dropcolumn INTEGER NOT NULL DEFAULT 0,
    changecolumn INTEGER NOT NULL DEFAULT 0,
    alteroption INTEGER NOT NULL DEFAULT 0,
    alterconvert INTEGER NOT NULL DEFAULT 0,
    createtable INTEGER NOT NULL DEFAULT 0,
    droptable INTEGER NOT NULL DEFAULT 0,
    createdb INTEGER NOT NULL DEFAULT 0,
    truncating INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (source, session_id)
) STRICT;
"#;
