//! Top-level engine error aggregating subsystem errors.

use super::error_code::{self, RewindErrorCode};
use super::{CaptureError, CodecError, ConfigError, ProviderError, StorageError};

/// Errors surfaced by the audit engine for one statement or one session.
/// None of these abort the audited statement; they are reported alongside it.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("snapshot mismatch: {detail}")]
    SnapshotMismatch { detail: String },

    #[error("Session cancelled")]
    Cancelled,
}

impl RewindErrorCode for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Codec(e) => e.error_code(),
            Self::Capture(e) => e.error_code(),
            Self::Provider(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::SnapshotMismatch { .. } => error_code::SNAPSHOT_MISMATCH,
            Self::Cancelled => error_code::CANCELLED,
        }
    }
}
