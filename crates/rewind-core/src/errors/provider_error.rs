//! Errors surfaced by the audited-database collaborators.

use super::error_code::{self, RewindErrorCode};

/// Errors returned by `ExecutionProvider` and `SchemaProvider` implementations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// The server rejected the statement. `code` is the server error number.
    #[error("execution failed ({code}): {message}")]
    Execution { code: u32, message: String },

    #[error("connection lost: {message}")]
    ConnectionLost { message: String },

    #[error("schema lookup failed for {table}: {message}")]
    Schema { table: String, message: String },
}

impl RewindErrorCode for ProviderError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Execution { .. } => error_code::EXECUTION_FAILED,
            Self::ConnectionLost { .. } | Self::Schema { .. } => error_code::PROVIDER_ERROR,
        }
    }
}
