//! Row image capture errors.

use super::error_code::{self, RewindErrorCode};
use super::{CodecError, ProviderError};

/// Errors raised while capturing before/after row images.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The after image cannot be reconciled with the before image
    /// (row vanished, key unknown, ignored rows).
    #[error("capture inconsistency on {table}: {detail}")]
    Inconsistency { table: String, detail: String },

    #[error("table {table} not found in schema snapshot")]
    TableNotFound { table: String },

    #[error("statement on {table} touched {rows} rows, capture limit is {limit}")]
    RowLimitExceeded { table: String, rows: usize, limit: usize },

    #[error("row width {actual} does not match {expected} columns of {table}")]
    RowShape {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl RewindErrorCode for CaptureError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Inconsistency { .. } => error_code::CAPTURE_INCONSISTENCY,
            Self::TableNotFound { .. } => error_code::SNAPSHOT_MISMATCH,
            Self::RowLimitExceeded { .. } | Self::RowShape { .. } => error_code::CAPTURE_ERROR,
            Self::Codec(e) => e.error_code(),
            Self::Provider(e) => e.error_code(),
        }
    }
}
