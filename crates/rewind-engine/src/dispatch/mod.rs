//! Statement dispatch: classify, capture, execute, build the rollback.
//!
//! ```text
//! Idle -> Dispatching -> { Captured | Skipped | Failed } -> Idle
//! ```
//!
//! The audited statement is always executed, whatever happens to its
//! rollback. Capture failures surface as `RollbackOutcome::Failed` or as
//! issues on a captured record; execution failures are reported as-is and
//! never produce a rollback.

pub mod classify;

pub use classify::{classify, Classification};

use rewind_core::config::RewindConfig;
use rewind_core::errors::{CaptureError, EngineError, ProviderError, StorageError};
use rewind_core::traits::{ExecOutcome, ExecutionProvider, OnlineSchemaChange, SchemaProvider};
use rewind_core::types::{
    AlterSpec, AuditedStatement, BackupLocation, OpIdGenerator, OperationRecord, RollbackBlock, SkipReason,
    Statement, StatementKind, TableIdent, TableName, TableSchema,
};

use crate::capture::{self, CaptureOptions, DecodedRows, PendingInsert, PendingUpdate};
use crate::rollback::ddl::{self, DdlContext};
use crate::stats::StatisticsAggregator;

/// Dispatcher settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub backup_enabled: bool,
    pub capture: CaptureOptions,
    pub default_charset: String,
}

impl DispatchOptions {
    pub fn from_config(config: &RewindConfig) -> Self {
        Self {
            backup_enabled: config.backup.effective_enabled(),
            capture: CaptureOptions::from_config(config),
            default_charset: config.server.effective_default_charset().to_string(),
        }
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::from_config(&RewindConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    #[default]
    Idle,
    Dispatching,
    Captured,
    Skipped,
    Failed,
}

/// Audited-database collaborators borrowed for one dispatch.
pub struct DispatchContext<'a> {
    pub exec: &'a mut dyn ExecutionProvider,
    pub schema: &'a dyn SchemaProvider,
    pub osc: &'a dyn OnlineSchemaChange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionStatus {
    Succeeded(ExecOutcome),
    Failed(ProviderError),
}

impl ExecutionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn affected_rows(&self) -> u64 {
        match self {
            Self::Succeeded(outcome) => outcome.affected_rows,
            Self::Failed(_) => 0,
        }
    }
}

#[derive(Debug)]
pub enum RollbackOutcome {
    Captured(OperationRecord),
    Skipped(SkipReason),
    Failed(EngineError),
}

impl RollbackOutcome {
    pub fn record(&self) -> Option<&OperationRecord> {
        match self {
            Self::Captured(record) => Some(record),
            _ => None,
        }
    }

    /// State the dispatcher passed through before returning to `Idle`.
    pub fn state(&self) -> DispatchState {
        match self {
            Self::Captured(_) => DispatchState::Captured,
            Self::Skipped(_) => DispatchState::Skipped,
            Self::Failed(_) => DispatchState::Failed,
        }
    }
}

/// Result of one audited statement.
#[derive(Debug)]
pub struct StatementReport {
    pub sequence: u32,
    pub sql: String,
    pub kind: StatementKind,
    pub execution: ExecutionStatus,
    pub outcome: RollbackOutcome,
    /// Where the rollback was queued, once handed to the batch writer.
    pub backup_location: Option<BackupLocation>,
    /// Backup write failures surfaced while queueing this statement.
    pub backup_warnings: Vec<StorageError>,
}

impl StatementReport {
    /// `Execute Successfully` plus `Backup Successfully` once a rollback
    /// was queued without warnings.
    pub fn stage_status(&self) -> String {
        let mut status = match &self.execution {
            ExecutionStatus::Succeeded(_) => "Execute Successfully".to_string(),
            ExecutionStatus::Failed(_) => "Execute failed".to_string(),
        };
        match &self.outcome {
            RollbackOutcome::Captured(_) if self.backup_warnings.is_empty() => {
                status.push_str("\nBackup Successfully");
            }
            RollbackOutcome::Captured(_) | RollbackOutcome::Failed(_) => {
                status.push_str("\nBackup failed");
            }
            RollbackOutcome::Skipped(_) => {}
        }
        status
    }

    pub fn backup_database(&self) -> Option<&str> {
        self.backup_location.as_ref().map(|l| l.database.as_str())
    }

    /// Rendered opid, `None` when nothing was captured.
    pub fn op_id(&self) -> Option<String> {
        self.outcome.record().map(|r| r.op_id.to_string())
    }
}

/// What was captured ahead of execution.
enum Plan {
    Insert(TableSchema, PendingInsert),
    Delete(TableSchema, DecodedRows),
    Update(TableSchema, PendingUpdate),
    /// DDL rollbacks depend only on the snapshot and the statement.
    Ddl(TableIdent, RollbackBlock),
}

pub struct Dispatcher {
    options: DispatchOptions,
    state: DispatchState,
    current_db: Option<String>,
    op_ids: OpIdGenerator,
    sequence: u32,
    stats: StatisticsAggregator,
}

impl Dispatcher {
    pub fn new(options: DispatchOptions, session_id: u64, current_db: Option<String>) -> Self {
        Self {
            options,
            state: DispatchState::Idle,
            current_db,
            op_ids: OpIdGenerator::new(session_id),
            sequence: 0,
            stats: StatisticsAggregator::new(),
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn current_database(&self) -> Option<&str> {
        self.current_db.as_deref()
    }

    pub fn session_id(&self) -> u64 {
        self.op_ids.session_id()
    }

    pub fn statistics(&self) -> &StatisticsAggregator {
        &self.stats
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    pub fn dispatch(&mut self, ctx: &mut DispatchContext<'_>, stmt: &AuditedStatement) -> StatementReport {
        self.state = DispatchState::Dispatching;
        self.sequence += 1;
        let classification = classify(&stmt.statement);
        let span = tracing::debug_span!(
            "dispatch",
            sequence = self.sequence,
            kind = %classification.kind
        );
        let _guard = span.enter();
        self.stats.record(&classification);

        let skip = if !self.options.backup_enabled {
            Some(SkipReason::BackupDisabled)
        } else {
            classification.skip_reason()
        };

        let (execution, outcome) = match skip {
            Some(reason) => {
                let execution = execute(ctx.exec, &stmt.sql);
                (execution, RollbackOutcome::Skipped(reason))
            }
            None => {
                let plan = self.prepare(ctx, &stmt.statement);
                let execution = execute(ctx.exec, &stmt.sql);
                let outcome = match (plan, &execution) {
                    (_, ExecutionStatus::Failed(_)) => RollbackOutcome::Skipped(SkipReason::NothingToUndo),
                    (Err(e), _) => RollbackOutcome::Failed(e),
                    (Ok(plan), ExecutionStatus::Succeeded(exec_outcome)) => {
                        let (table, block) = self.complete(ctx, plan, exec_outcome);
                        self.record(stmt, classification.kind, exec_outcome, table, block)
                    }
                };
                (execution, outcome)
            }
        };

        if let (Statement::UseDatabase { database }, ExecutionStatus::Succeeded(_)) =
            (&stmt.statement, &execution)
        {
            self.current_db = Some(database.clone());
        }

        if let RollbackOutcome::Failed(e) = &outcome {
            tracing::warn!(error = %e, "rollback generation failed");
        }
        tracing::trace!(state = ?outcome.state(), "dispatch settled");
        self.state = DispatchState::Idle;

        StatementReport {
            sequence: self.sequence,
            sql: stmt.sql.clone(),
            kind: classification.kind,
            execution,
            outcome,
            backup_location: None,
            backup_warnings: Vec::new(),
        }
    }

    fn resolve(&self, table: &TableName) -> Result<TableIdent, EngineError> {
        table
            .resolve(self.current_db.as_deref())
            .ok_or_else(|| EngineError::SnapshotMismatch {
                detail: format!("no database selected for table `{}`", table.name),
            })
    }

    fn existing(&self, ctx: &DispatchContext<'_>, table: &TableName) -> Result<TableSchema, EngineError> {
        let ident = self.resolve(table)?;
        ctx.schema
            .snapshot(&ident.schema, &ident.name)?
            .ok_or_else(|| {
                CaptureError::TableNotFound {
                    table: ident.to_string(),
                }
                .into()
            })
    }

    fn ddl_context(&self, osc_managed: bool) -> DdlContext<'_> {
        DdlContext {
            default_charset: &self.options.default_charset,
            osc_managed,
        }
    }

    /// Everything that must be read before the statement runs.
    fn prepare(&self, ctx: &mut DispatchContext<'_>, stmt: &Statement) -> Result<Plan, EngineError> {
        let opts = &self.options.capture;
        let plan = match stmt {
            Statement::Insert(insert) => {
                let schema = self.existing(ctx, &insert.table)?;
                let pending = capture::insert::before(ctx.exec, &schema, insert, opts)?;
                Plan::Insert(schema, pending)
            }
            Statement::Delete(delete) => {
                let schema = self.existing(ctx, &delete.table)?;
                let rows = capture::delete::before(ctx.exec, &schema, delete, opts)?;
                Plan::Delete(schema, rows)
            }
            Statement::Update(update) => {
                let schema = self.existing(ctx, &update.table)?;
                let pending = capture::update::before(ctx.exec, &schema, update, opts)?;
                Plan::Update(schema, pending)
            }
            Statement::CreateTable(create) => {
                let ident = self.resolve(&create.table)?;
                let before = ctx.schema.snapshot(&ident.schema, &ident.name)?;
                let block = ddl::create_table(&ident, &before);
                Plan::Ddl(ident, block)
            }
            Statement::AlterTable(alter) => {
                let ident = self.resolve(&alter.table)?;
                let before = ctx.schema.snapshot(&ident.schema, &ident.name)?;
                let managed = ctx.osc.is_managed(&ident.schema, &ident.name);
                let block = ddl::alter_table(&ident, &alter.specs, &before, self.ddl_context(managed));
                let renamed = alter.specs.iter().fold(ident, |current, spec| match spec {
                    AlterSpec::RenameTo(to) => {
                        TableIdent::new(to.schema.as_deref().unwrap_or(&current.schema), &to.name)
                    }
                    _ => current,
                });
                Plan::Ddl(renamed, block)
            }
            Statement::DropTable(drop) => {
                let mut tables = Vec::with_capacity(drop.tables.len());
                for name in &drop.tables {
                    let ident = self.resolve(name)?;
                    let before = ctx.schema.snapshot(&ident.schema, &ident.name)?;
                    tables.push((ident, before));
                }
                let Some((first, _)) = tables.first() else {
                    return Err(EngineError::SnapshotMismatch {
                        detail: "DROP TABLE without tables".into(),
                    });
                };
                let first = first.clone();
                let block = ddl::drop_table(&tables, drop.if_exists, self.ddl_context(false));
                Plan::Ddl(first, block)
            }
            Statement::RenameTable(rename) => {
                let pairs = rename
                    .pairs
                    .iter()
                    .map(|(from, to)| -> Result<_, EngineError> {
                        Ok((self.resolve(from)?, self.resolve(to)?))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let Some((_, renamed)) = pairs.first() else {
                    return Err(EngineError::SnapshotMismatch {
                        detail: "RENAME TABLE without tables".into(),
                    });
                };
                let renamed = renamed.clone();
                Plan::Ddl(renamed, ddl::rename_table(&pairs))
            }
            Statement::CreateIndex(create) => {
                let ident = self.resolve(&create.table)?;
                let before = ctx.schema.snapshot(&ident.schema, &ident.name)?;
                let block = ddl::create_index(&ident, create, &before);
                Plan::Ddl(ident, block)
            }
            Statement::DropIndex(drop) => {
                let ident = self.resolve(&drop.table)?;
                let before = ctx.schema.snapshot(&ident.schema, &ident.name)?;
                let block = ddl::drop_index(&ident, &drop.name, &before);
                Plan::Ddl(ident, block)
            }
            Statement::UseDatabase { .. }
            | Statement::Select
            | Statement::CreateDatabase { .. }
            | Statement::DropDatabase { .. }
            | Statement::Truncate { .. }
            | Statement::Other => {
                return Err(EngineError::SnapshotMismatch {
                    detail: "statement has no rollback".into(),
                })
            }
        };
        Ok(plan)
    }

    /// Turn the pre-execution capture into a rollback block.
    fn complete(
        &self,
        ctx: &mut DispatchContext<'_>,
        plan: Plan,
        outcome: &ExecOutcome,
    ) -> (TableIdent, RollbackBlock) {
        let opts = &self.options.capture;
        match plan {
            Plan::Insert(schema, pending) => {
                let block = capture::insert::rollback(&schema, pending, outcome);
                (schema.ident(), block)
            }
            Plan::Delete(schema, rows) => {
                let block = capture::delete::rollback(&schema, rows, outcome);
                (schema.ident(), block)
            }
            Plan::Update(schema, pending) => {
                let block = capture::update::rollback(ctx.exec, &schema, pending, opts);
                (schema.ident(), block)
            }
            Plan::Ddl(table, block) => (table, block),
        }
    }

    fn record(
        &mut self,
        stmt: &AuditedStatement,
        kind: StatementKind,
        outcome: &ExecOutcome,
        table: TableIdent,
        block: RollbackBlock,
    ) -> RollbackOutcome {
        if block.is_empty() && block.is_complete() {
            return RollbackOutcome::Skipped(SkipReason::NothingToUndo);
        }
        for issue in &block.issues {
            tracing::warn!(table = %table, issue = %issue, "rollback incomplete");
        }
        let record = OperationRecord {
            sequence: self.sequence,
            sql: stmt.sql.clone(),
            kind,
            affected_rows: outcome.affected_rows,
            op_id: self.op_ids.next_id(),
            table,
            rollback: block,
        };
        tracing::debug!(
            op_id = %record.op_id,
            statements = record.rollback.len(),
            "captured rollback"
        );
        RollbackOutcome::Captured(record)
    }
}

fn execute(exec: &mut dyn ExecutionProvider, sql: &str) -> ExecutionStatus {
    match exec.execute(sql) {
        Ok(outcome) => ExecutionStatus::Succeeded(outcome),
        Err(e) => {
            tracing::warn!(error = %e, "audited statement failed");
            ExecutionStatus::Failed(e)
        }
    }
}
