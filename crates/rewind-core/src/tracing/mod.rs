//! Structured logging setup.

pub mod setup;

pub use setup::init_tracing;
