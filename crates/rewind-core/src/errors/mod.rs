//! Error handling for rewind.
//! One error enum per subsystem, `thiserror` only.

pub mod capture_error;
pub mod codec_error;
pub mod config_error;
pub mod engine_error;
pub mod error_code;
pub mod provider_error;
pub mod storage_error;

pub use capture_error::CaptureError;
pub use codec_error::CodecError;
pub use config_error::ConfigError;
pub use engine_error::EngineError;
pub use error_code::RewindErrorCode;
pub use provider_error::ProviderError;
pub use storage_error::StorageError;
