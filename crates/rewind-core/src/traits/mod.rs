//! Collaborator traits at the engine's seams.

pub mod backup;
pub mod cancellation;
pub mod provider;

pub use backup::BackupStore;
pub use cancellation::{Cancellable, CancellationToken};
pub use provider::{
    ConfiguredOnlineSchemaChange, ExecOutcome, ExecutionProvider, OnlineSchemaChange,
    SchemaProvider,
};
