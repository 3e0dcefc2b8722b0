//! Configuration system: TOML files, environment variables and CLI overrides.

pub mod backup_config;
pub mod osc_config;
pub mod rewind_config;
pub mod rollback_config;
pub mod server_config;
pub mod statistics_config;

pub use backup_config::BackupConfig;
pub use osc_config::OscConfig;
pub use rewind_config::{CliOverrides, RewindConfig};
pub use rollback_config::RollbackConfig;
pub use server_config::ServerConfig;
pub use statistics_config::StatisticsConfig;
