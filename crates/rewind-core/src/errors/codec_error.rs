//! Value codec errors.

use super::error_code::{self, RewindErrorCode};

/// Errors raised while decoding a raw cell or rendering a literal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("column `{column}` has unsupported type {column_type}")]
    UnsupportedType { column: String, column_type: String },

    #[error("column `{column}` holds a value that does not match {column_type}: {detail}")]
    InvalidValue {
        column: String,
        column_type: String,
        detail: String,
    },
}

impl RewindErrorCode for CodecError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedType { .. } => error_code::CODEC_UNSUPPORTED_TYPE,
            Self::InvalidValue { .. } => error_code::CODEC_INVALID_VALUE,
        }
    }
}
