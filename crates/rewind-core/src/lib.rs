//! # rewind-core
//!
//! Shared foundation for the rewind SQL audit engine: the statement model,
//! captured schema and row types, operation records, collaborator traits,
//! errors, configuration and tracing setup.

pub mod config;
pub mod errors;
pub mod traits;
pub mod tracing;
pub mod types;

pub use errors::{EngineError, RewindErrorCode};
pub use types::{AuditedStatement, OperationRecord, Statement, StatementKind};
