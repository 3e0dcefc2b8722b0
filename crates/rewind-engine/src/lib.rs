//! # rewind-engine
//!
//! Rollback generation for audited SQL statements: the value codec, row
//! image capture around DML, minimal-diff UPDATE inverses, DDL inversion
//! from schema snapshots, statement dispatch, statistics, and the audit
//! session tying them to the backup batch writer.

pub mod capture;
pub mod codec;
pub mod dispatch;
pub mod rollback;
pub mod session;
pub mod stats;

pub use dispatch::{
    classify, Classification, DispatchContext, DispatchOptions, DispatchState, Dispatcher,
    ExecutionStatus, RollbackOutcome, StatementReport,
};
pub use session::{AuditSession, Collaborators, SessionOptions, SessionSummary};
pub use stats::StatisticsAggregator;
