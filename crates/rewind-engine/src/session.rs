//! Audit session: one connection's statements, their rollbacks, and the
//! batches queued for the backup store.

use std::sync::Arc;

use rewind_core::config::RewindConfig;
use rewind_core::errors::{EngineError, StorageError};
use rewind_core::traits::{
    BackupStore, Cancellable, CancellationToken, ConfiguredOnlineSchemaChange, ExecutionProvider,
    OnlineSchemaChange, SchemaProvider,
};
use rewind_core::types::{AuditedStatement, BackupLocation, SourceIdent, StatisticsCounters};
use rewind_storage::{BackupBatchWriter, BatchPolicy, FlushStats, SqliteBackupStore};

use crate::dispatch::{
    DispatchContext, DispatchOptions, Dispatcher, RollbackOutcome, StatementReport,
};

/// Identity and settings of a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Audited server, used to name backup databases.
    pub source: SourceIdent,
    /// Connection id on the audited server.
    pub session_id: u64,
    /// Database selected when the session starts.
    pub database: Option<String>,
    pub config: RewindConfig,
}

impl SessionOptions {
    pub fn new(source: SourceIdent, session_id: u64) -> Self {
        Self {
            source,
            session_id,
            database: None,
            config: RewindConfig::default(),
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_config(mut self, config: RewindConfig) -> Self {
        self.config = config;
        self
    }
}

/// The session's view of the outside world.
pub struct Collaborators {
    pub exec: Box<dyn ExecutionProvider>,
    pub schema: Box<dyn SchemaProvider>,
    /// Defaults to the configured pt-osc / gh-ost switches.
    pub osc: Option<Box<dyn OnlineSchemaChange>>,
    pub store: Arc<dyn BackupStore>,
}

impl Collaborators {
    /// Collaborators backed by the SQLite store at `backup.store_path`.
    pub fn with_configured_store(
        exec: Box<dyn ExecutionProvider>,
        schema: Box<dyn SchemaProvider>,
        config: &RewindConfig,
    ) -> Result<Self, StorageError> {
        let store = SqliteBackupStore::open_configured(&config.backup)?;
        Ok(Self {
            exec,
            schema,
            osc: None,
            store: Arc::new(store),
        })
    }
}

/// Totals returned by [`AuditSession::finish`].
#[derive(Debug, Default)]
pub struct SessionSummary {
    pub session_id: u64,
    pub statements: usize,
    pub captured: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Captured records carrying at least one issue.
    pub incomplete: usize,
    pub flush: FlushStats,
    pub statistics: StatisticsCounters,
    /// Batches left queued and statistics that could not be written.
    pub warnings: Vec<StorageError>,
}

pub struct AuditSession {
    exec: Box<dyn ExecutionProvider>,
    schema: Box<dyn SchemaProvider>,
    osc: Box<dyn OnlineSchemaChange>,
    store: Arc<dyn BackupStore>,
    writer: BackupBatchWriter,
    source: SourceIdent,
    statistics_enabled: bool,
    token: CancellationToken,
    dispatcher: Dispatcher,
    summary: SessionSummary,
    finished: bool,
}

impl AuditSession {
    pub fn new(options: SessionOptions, collaborators: Collaborators) -> Self {
        let config = &options.config;
        let osc = collaborators.osc.unwrap_or_else(|| -> Box<dyn OnlineSchemaChange> {
            Box::new(ConfiguredOnlineSchemaChange {
                enabled: config.osc.any_enabled(),
            })
        });
        let writer = BackupBatchWriter::new(
            Arc::clone(&collaborators.store),
            BatchPolicy::from_config(&config.backup),
        );
        let dispatcher = Dispatcher::new(
            DispatchOptions::from_config(config),
            options.session_id,
            options.database.clone(),
        );
        tracing::debug!(
            source = %options.source,
            session_id = options.session_id,
            "audit session started"
        );
        Self {
            exec: collaborators.exec,
            schema: collaborators.schema,
            osc,
            store: collaborators.store,
            writer,
            source: options.source,
            statistics_enabled: config.statistics.effective_enabled(),
            token: CancellationToken::new(),
            dispatcher,
            summary: SessionSummary {
                session_id: options.session_id,
                ..SessionSummary::default()
            },
            finished: false,
        }
    }

    /// Execute one audited statement and queue its rollback.
    pub fn execute(&mut self, stmt: &AuditedStatement) -> Result<StatementReport, EngineError> {
        if self.token.is_cancelled() {
            self.flush_queued();
            return Err(EngineError::Cancelled);
        }

        let mut ctx = DispatchContext {
            exec: self.exec.as_mut(),
            schema: self.schema.as_ref(),
            osc: self.osc.as_ref(),
        };
        let mut report = self.dispatcher.dispatch(&mut ctx, stmt);

        self.summary.statements += 1;
        match &report.outcome {
            RollbackOutcome::Captured(record) => {
                self.summary.captured += 1;
                if record.is_incomplete() {
                    self.summary.incomplete += 1;
                }
                let location = BackupLocation::for_table(&self.source, &record.table);
                if let Err(e) = self.writer.append(location.clone(), record.clone()) {
                    report.backup_warnings.push(e);
                }
                report.backup_location = Some(location);
            }
            RollbackOutcome::Skipped(_) => self.summary.skipped += 1,
            RollbackOutcome::Failed(_) => self.summary.failed += 1,
        }
        Ok(report)
    }

    /// Flush every queued batch, as at the end of a transaction.
    pub fn commit(&mut self) -> Vec<StorageError> {
        self.writer.flush_all()
    }

    /// Flush queued batches, persist statistics and return the totals.
    pub fn finish(mut self) -> SessionSummary {
        self.finished = true;
        let mut warnings = self.writer.flush_all();
        if self.statistics_enabled {
            let stats = self.dispatcher.statistics();
            if let Err(e) = stats.persist(self.store.as_ref(), &self.source, self.summary.session_id) {
                tracing::warn!(error = %e, "session statistics not persisted");
                warnings.push(e);
            }
        }
        let mut summary = std::mem::take(&mut self.summary);
        summary.flush = self.writer.stats();
        summary.statistics = *self.dispatcher.statistics().counters();
        summary.warnings = warnings;
        tracing::info!(
            session_id = summary.session_id,
            statements = summary.statements,
            captured = summary.captured,
            failed = summary.failed,
            "audit session finished"
        );
        summary
    }

    /// Reject further statements and flush what is already queued.
    pub fn cancel(&mut self) -> Vec<StorageError> {
        self.token.cancel();
        self.writer.flush_all()
    }

    /// Token that cancels this session from another thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn flush_stats(&self) -> FlushStats {
        self.writer.stats()
    }

    pub fn pending_records(&self) -> usize {
        self.writer.pending_records()
    }

    fn flush_queued(&mut self) {
        if self.writer.pending_records() == 0 {
            return;
        }
        for e in self.writer.flush_all() {
            tracing::warn!(error = %e, "backup batch left queued on cancellation");
        }
    }
}

impl Drop for AuditSession {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                session_id = self.summary.session_id,
                "audit session dropped before finish"
            );
            self.flush_queued();
        }
    }
}
