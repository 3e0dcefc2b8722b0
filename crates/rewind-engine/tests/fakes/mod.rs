//! Scripted stand-ins for the audited server.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use rewind_core::errors::{ProviderError, StorageError};
use rewind_core::traits::{BackupStore, ExecOutcome, ExecutionProvider, SchemaProvider};
use rewind_core::types::{
    BackupLocation, OperationRecord, RawCell, SchemaSnapshot, SourceIdent, StatisticsCounters,
    TableSchema,
};

#[derive(Default)]
struct Script {
    query_results: VecDeque<Vec<Vec<RawCell>>>,
    exec_results: VecDeque<Result<ExecOutcome, ProviderError>>,
    log: Vec<String>,
}

/// Execution provider answering from queued results, in order.
/// Unscripted executes succeed with zero rows, unscripted queries return nothing.
#[derive(Clone, Default)]
pub struct ScriptedServer {
    script: Arc<Mutex<Script>>,
}

impl ScriptedServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_query(&self, rows: Vec<Vec<RawCell>>) -> &Self {
        self.script.lock().unwrap().query_results.push_back(rows);
        self
    }

    pub fn on_execute(&self, affected_rows: u64, last_insert_id: u64) -> &Self {
        self.script
            .lock()
            .unwrap()
            .exec_results
            .push_back(Ok(ExecOutcome {
                affected_rows,
                last_insert_id,
            }));
        self
    }

    pub fn on_execute_error(&self, code: u32, message: &str) -> &Self {
        self.script
            .lock()
            .unwrap()
            .exec_results
            .push_back(Err(ProviderError::Execution {
                code,
                message: message.into(),
            }));
        self
    }

    /// Every statement and query seen, in order.
    pub fn log(&self) -> Vec<String> {
        self.script.lock().unwrap().log.clone()
    }
}

impl ExecutionProvider for ScriptedServer {
    fn execute(&mut self, sql: &str) -> Result<ExecOutcome, ProviderError> {
        let mut script = self.script.lock().unwrap();
        script.log.push(sql.to_string());
        script
            .exec_results
            .pop_front()
            .unwrap_or(Ok(ExecOutcome::default()))
    }

    fn query(&mut self, sql: &str) -> Result<Vec<Vec<RawCell>>, ProviderError> {
        let mut script = self.script.lock().unwrap();
        script.log.push(sql.to_string());
        Ok(script.query_results.pop_front().unwrap_or_default())
    }
}

/// Schema provider over a mutable table map.
#[derive(Clone, Default)]
pub struct Schemas {
    tables: Arc<Mutex<HashMap<(String, String), TableSchema>>>,
}

impl Schemas {
    pub fn with(tables: impl IntoIterator<Item = TableSchema>) -> Self {
        let schemas = Self::default();
        for t in tables {
            schemas.put(t);
        }
        schemas
    }

    pub fn put(&self, table: TableSchema) {
        self.tables
            .lock()
            .unwrap()
            .insert((table.schema.clone(), table.name.clone()), table);
    }

    pub fn remove(&self, schema: &str, name: &str) {
        self.tables
            .lock()
            .unwrap()
            .remove(&(schema.to_string(), name.to_string()));
    }
}

impl SchemaProvider for Schemas {
    fn snapshot(&self, schema: &str, table: &str) -> Result<SchemaSnapshot, ProviderError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(&(schema.to_string(), table.to_string()))
            .cloned())
    }
}

/// Backup store keeping everything in memory.
#[derive(Default)]
pub struct MemoryStore {
    pub batches: Mutex<Vec<(BackupLocation, Vec<OperationRecord>)>>,
    pub statistics: Mutex<Vec<(SourceIdent, u64, StatisticsCounters)>>,
    pub fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn records(&self) -> Vec<OperationRecord> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, records)| records.iter().cloned())
            .collect()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

impl BackupStore for MemoryStore {
    fn write_batch(
        &self,
        location: &BackupLocation,
        records: &[OperationRecord],
    ) -> Result<(), StorageError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(StorageError::SqliteError {
                message: "disk I/O error".into(),
            });
        }
        self.batches
            .lock()
            .unwrap()
            .push((location.clone(), records.to_vec()));
        Ok(())
    }

    fn write_statistics(
        &self,
        source: &SourceIdent,
        session_id: u64,
        counters: &StatisticsCounters,
    ) -> Result<(), StorageError> {
        self.statistics
            .lock()
            .unwrap()
            .push((source.clone(), session_id, *counters));
        Ok(())
    }
}

pub fn cell(s: &str) -> RawCell {
    Some(s.as_bytes().to_vec())
}

pub fn null() -> RawCell {
    None
}
