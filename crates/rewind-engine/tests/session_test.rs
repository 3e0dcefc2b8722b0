//! Audit session tests: batching into the backup store, statistics at
//! teardown, cancellation and drop.

mod fakes;

use std::sync::Arc;

use fakes::{MemoryStore, ScriptedServer, Schemas};
use rewind_core::config::RewindConfig;
use rewind_core::errors::EngineError;
use rewind_core::traits::{BackupStore, Cancellable};
use rewind_core::types::*;
use rewind_engine::{AuditSession, Collaborators, RollbackOutcome, SessionOptions};
use rewind_storage::SqliteBackupStore;

fn t1() -> TableSchema {
    TableSchema::new("test_inc", "t1")
        .with_column(ColumnDef::new("id", "int(11)").not_null())
        .with_column(ColumnDef::new("c1", "int(11)"))
        .with_index(IndexDef::primary(["id"]))
}

fn insert(id: i64) -> AuditedStatement {
    AuditedStatement::new(
        format!("insert into t1 values({id},{id})"),
        Statement::Insert(InsertStatement {
            table: TableName::new("t1"),
            columns: vec![],
            source: InsertSource::Values(vec![vec![
                InsertValue::text(id.to_string()),
                InsertValue::text(id.to_string()),
            ]]),
            ignore: false,
        }),
    )
}

fn session(config: RewindConfig, store: Arc<dyn BackupStore>) -> AuditSession {
    let server = ScriptedServer::new();
    for _ in 0..16 {
        server.on_execute(1, 0);
    }
    AuditSession::new(
        SessionOptions::new(SourceIdent::new("127.0.0.1", 3306), 7)
            .with_database("test_inc")
            .with_config(config),
        Collaborators {
            exec: Box::new(server),
            schema: Box::new(Schemas::with([t1()])),
            osc: None,
            store,
        },
    )
}

fn batch_of(n: usize) -> RewindConfig {
    RewindConfig::from_toml(&format!("[backup]\nbatch_size = {n}\nretry_backoff_ms = 0\n")).unwrap()
}

#[test]
fn batches_flush_at_threshold_and_on_commit() {
    let store = Arc::new(MemoryStore::default());
    let mut s = session(batch_of(2), store.clone());

    s.execute(&insert(1)).unwrap();
    assert_eq!(store.batch_count(), 0);
    s.execute(&insert(2)).unwrap();
    assert_eq!(store.batch_count(), 1);

    s.execute(&insert(3)).unwrap();
    assert_eq!(s.pending_records(), 1);
    assert!(s.commit().is_empty());
    assert_eq!(store.batch_count(), 2);
    assert_eq!(s.pending_records(), 0);
    assert_eq!(s.flush_stats().records_written, 3);

    let sequences: Vec<u32> = store.records().iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
}

#[test]
fn report_names_backup_database() {
    let store = Arc::new(MemoryStore::default());
    let mut s = session(RewindConfig::default(), store);

    let report = s.execute(&insert(1)).unwrap();
    assert_eq!(report.backup_database(), Some("127_0_0_1_3306_test_inc"));
    assert!(report.op_id().unwrap().starts_with(&format!(
        "{}_7_",
        report.outcome.record().unwrap().op_id.timestamp
    )));
}

#[test]
fn failed_flush_keeps_records_and_warns() {
    let store = Arc::new(MemoryStore::default());
    *store.fail_writes.lock().unwrap() = true;
    let mut s = session(batch_of(1), store.clone());

    let report = s.execute(&insert(1)).unwrap();
    assert!(matches!(report.outcome, RollbackOutcome::Captured(_)));
    assert_eq!(report.backup_warnings.len(), 1);
    assert_eq!(report.stage_status(), "Execute Successfully\nBackup failed");
    assert_eq!(s.pending_records(), 1);

    *store.fail_writes.lock().unwrap() = false;
    assert!(s.commit().is_empty());
    assert_eq!(store.records().len(), 1);
}

#[test]
fn finish_flushes_and_persists_statistics() {
    let store = Arc::new(MemoryStore::default());
    let mut s = session(RewindConfig::default(), store.clone());

    s.execute(&insert(1)).unwrap();
    s.execute(&AuditedStatement::new("select 1", Statement::Select))
        .unwrap();
    let summary = s.finish();

    assert_eq!(summary.statements, 2);
    assert_eq!(summary.captured, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.flush.records_written, 1);
    assert!(summary.warnings.is_empty());
    assert_eq!(summary.statistics.get(StatCategory::Insert), 1);

    let stats = store.statistics.lock().unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].1, 7);
    assert_eq!(stats[0].2.get(StatCategory::Select), 1);
}

#[test]
fn statistics_can_be_disabled() {
    let store = Arc::new(MemoryStore::default());
    let config = RewindConfig::from_toml("[statistics]\nenabled = false\n").unwrap();
    let s = session(config, store.clone());
    s.finish();
    assert!(store.statistics.lock().unwrap().is_empty());
}

#[test]
fn backup_disabled_skips_rollbacks() {
    let store = Arc::new(MemoryStore::default());
    let config = RewindConfig::from_toml("[backup]\nenabled = false\n").unwrap();
    let mut s = session(config, store.clone());

    let report = s.execute(&insert(1)).unwrap();
    assert!(matches!(
        report.outcome,
        RollbackOutcome::Skipped(SkipReason::BackupDisabled)
    ));
    assert!(report.execution.is_success());
    let summary = s.finish();
    assert_eq!(summary.captured, 0);
    assert_eq!(store.batch_count(), 0);
}

#[test]
fn cancel_flushes_and_rejects_further_statements() {
    let store = Arc::new(MemoryStore::default());
    let mut s = session(RewindConfig::default(), store.clone());

    s.execute(&insert(1)).unwrap();
    assert!(s.cancel().is_empty());
    assert_eq!(store.records().len(), 1);
    assert!(matches!(s.execute(&insert(2)), Err(EngineError::Cancelled)));
}

#[test]
fn token_cancels_from_outside() {
    let store = Arc::new(MemoryStore::default());
    let mut s = session(RewindConfig::default(), store.clone());
    let token = s.cancellation_token();

    s.execute(&insert(1)).unwrap();
    std::thread::spawn(move || token.cancel()).join().unwrap();

    assert!(matches!(s.execute(&insert(2)), Err(EngineError::Cancelled)));
    assert_eq!(store.records().len(), 1);
}

#[test]
fn drop_flushes_queued_batches() {
    let store = Arc::new(MemoryStore::default());
    {
        let mut s = session(RewindConfig::default(), store.clone());
        s.execute(&insert(1)).unwrap();
        s.execute(&insert(2)).unwrap();
        assert_eq!(store.batch_count(), 0);
    }
    assert_eq!(store.records().len(), 2);
}

#[test]
fn rollbacks_land_in_sqlite_store() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(SqliteBackupStore::open(&dir.path().join("backup.db")).unwrap());
    let mut s = session(RewindConfig::default(), store.clone());

    let report = s.execute(&insert(5)).unwrap();
    let opid = report.op_id().unwrap();
    let summary = s.finish();
    assert!(summary.warnings.is_empty());

    assert_eq!(
        store.rollback_statements(&opid).unwrap(),
        vec!["DELETE FROM `test_inc`.`t1` WHERE `id`=5;"]
    );
    let operation = store.operation(&opid).unwrap().unwrap();
    assert_eq!(operation.backup_db, "127_0_0_1_3306_test_inc");
    assert_eq!(operation.kind, "INSERT");
    assert!(!operation.incomplete);

    let stats = store
        .latest_statistics(&SourceIdent::new("127.0.0.1", 3306))
        .unwrap()
        .unwrap();
    assert_eq!(stats.counters.get(StatCategory::Insert), 1);
}

#[test]
fn configured_store_path_receives_the_backups() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("backup.db");
    let config = RewindConfig::from_toml(&format!(
        "[backup]\nstore_path = '{}'\nbatch_size = 1\n",
        path.display()
    ))
    .unwrap();
    assert_eq!(config.backup.effective_store_path(), path);

    let server = ScriptedServer::new();
    server.on_execute(1, 0);
    let collaborators = Collaborators::with_configured_store(
        Box::new(server),
        Box::new(Schemas::with([t1()])),
        &config,
    )
    .unwrap();
    let mut s = AuditSession::new(
        SessionOptions::new(SourceIdent::new("127.0.0.1", 3306), 9)
            .with_database("test_inc")
            .with_config(config),
        collaborators,
    );
    s.execute(&insert(1)).unwrap();
    let summary = s.finish();
    assert!(summary.warnings.is_empty());

    let reopened = SqliteBackupStore::open(&path).unwrap();
    assert_eq!(reopened.operation_count().unwrap(), 1);
}
