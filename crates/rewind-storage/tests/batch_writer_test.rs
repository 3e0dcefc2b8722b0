//! Batch writer tests: thresholds, flush-all, retries and retained batches.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rewind_core::errors::StorageError;
use rewind_core::traits::BackupStore;
use rewind_core::types::*;
use rewind_storage::{BackupBatchWriter, BatchPolicy, SqliteBackupStore};

/// Store that records writes and can be told to fail the next N attempts.
#[derive(Default)]
struct RecordingStore {
    fail_next: AtomicUsize,
    attempts: AtomicUsize,
    written: Mutex<Vec<(BackupLocation, Vec<u32>)>>,
}

impl RecordingStore {
    fn failing(n: usize) -> Self {
        Self {
            fail_next: AtomicUsize::new(n),
            ..Default::default()
        }
    }

    fn written(&self) -> Vec<(BackupLocation, Vec<u32>)> {
        self.written.lock().unwrap().clone()
    }
}

impl BackupStore for RecordingStore {
    fn write_batch(
        &self,
        location: &BackupLocation,
        records: &[OperationRecord],
    ) -> Result<(), StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(StorageError::SqliteError {
                message: "database is locked".into(),
            });
        }
        self.written.lock().unwrap().push((
            location.clone(),
            records.iter().map(|r| r.sequence).collect(),
        ));
        Ok(())
    }

    fn write_statistics(
        &self,
        _source: &SourceIdent,
        _session_id: u64,
        _counters: &StatisticsCounters,
    ) -> Result<(), StorageError> {
        Ok(())
    }
}

fn policy(batch_size: usize, retries: u32) -> BatchPolicy {
    BatchPolicy {
        batch_size,
        flush_retries: retries,
        retry_backoff: Duration::from_millis(1),
    }
}

fn record(table: &str, seq: u32) -> OperationRecord {
    OperationRecord {
        sequence: seq,
        sql: "delete from t".into(),
        kind: StatementKind::Delete,
        affected_rows: 1,
        op_id: OpId {
            timestamp: 1_700_000_000,
            session_id: 1,
            sequence: seq,
        },
        table: TableIdent::new("db", table),
        rollback: RollbackBlock {
            statements: vec![format!("INSERT INTO `db`.`{table}`(`id`) VALUES({seq});").into()],
            issues: Vec::new(),
        },
    }
}

fn loc(table: &str) -> BackupLocation {
    BackupLocation::for_table(&SourceIdent::new("127.0.0.1", 3306), &TableIdent::new("db", table))
}

#[test]
fn flushes_when_threshold_reached() {
    let store = Arc::new(RecordingStore::default());
    let mut writer = BackupBatchWriter::new(store.clone(), policy(2, 0));

    writer.append(loc("t1"), record("t1", 1)).unwrap();
    assert!(store.written().is_empty());
    assert_eq!(writer.pending_records(), 1);

    writer.append(loc("t1"), record("t1", 2)).unwrap();
    assert_eq!(store.written(), vec![(loc("t1"), vec![1, 2])]);
    assert_eq!(writer.pending_records(), 0);
    assert_eq!(writer.stats().flushes, 1);
    assert_eq!(writer.stats().statements_written, 2);
}

#[test]
fn batches_are_per_table() {
    let store = Arc::new(RecordingStore::default());
    let mut writer = BackupBatchWriter::new(store.clone(), policy(2, 0));

    writer.append(loc("t1"), record("t1", 1)).unwrap();
    writer.append(loc("t2"), record("t2", 2)).unwrap();
    assert!(store.written().is_empty(), "neither table reached its threshold");
    let queued: Vec<&str> = writer
        .pending_batches()
        .map(|b| b.location.table.as_str())
        .collect();
    assert_eq!(queued, vec!["t1", "t2"]);

    let failures = writer.flush_all();
    assert!(failures.is_empty());
    assert_eq!(
        store.written(),
        vec![(loc("t1"), vec![1]), (loc("t2"), vec![2])]
    );
}

#[test]
fn retries_then_succeeds() {
    let store = Arc::new(RecordingStore::failing(2));
    let mut writer = BackupBatchWriter::new(store.clone(), policy(1, 2));

    writer.append(loc("t1"), record("t1", 1)).unwrap();
    assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(writer.stats().retries, 2);
    assert_eq!(writer.stats().failures, 0);
    assert_eq!(store.written().len(), 1);
}

#[test]
fn failed_batch_stays_queued() {
    let store = Arc::new(RecordingStore::failing(3));
    let mut writer = BackupBatchWriter::new(store.clone(), policy(1, 1));

    let err = writer.append(loc("t1"), record("t1", 1)).unwrap_err();
    assert!(matches!(err, StorageError::BackupWriteFailure { attempts: 2, .. }));
    assert_eq!(writer.pending_records(), 1);
    assert_eq!(writer.stats().failures, 1);

    // Store recovers after one more failed attempt; the queued record is written
    // together with the next one.
    writer.append(loc("t1"), record("t1", 2)).unwrap();
    assert_eq!(store.written(), vec![(loc("t1"), vec![1, 2])]);
    assert_eq!(writer.pending_records(), 0);
}

#[test]
fn drop_flushes_pending_batches() {
    let store = Arc::new(RecordingStore::default());
    {
        let mut writer = BackupBatchWriter::new(store.clone(), policy(100, 0));
        writer.append(loc("t1"), record("t1", 1)).unwrap();
        writer.append(loc("t1"), record("t1", 2)).unwrap();
    }
    assert_eq!(store.written(), vec![(loc("t1"), vec![1, 2])]);
}

#[test]
fn writes_through_sqlite_store() {
    let store = Arc::new(SqliteBackupStore::open_in_memory().unwrap());
    let mut writer = BackupBatchWriter::new(store.clone(), policy(3, 0));
    for seq in 1..=5 {
        writer.append(loc("t1"), record("t1", seq)).unwrap();
    }
    assert_eq!(writer.pending_records(), 2);
    assert!(writer.flush_all().is_empty());

    let ops = store.operations_for_session(1).unwrap();
    assert_eq!(ops.len(), 5);
    assert_eq!(
        store.rollback_statements("1700000000_1_00000004").unwrap(),
        vec!["INSERT INTO `db`.`t1`(`id`) VALUES(4);".to_string()]
    );
    assert_eq!(writer.stats().flushes, 2);
}
