//! Top-level rewind configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{BackupConfig, OscConfig, RollbackConfig, ServerConfig, StatisticsConfig};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`REWIND_*`)
/// 3. Project config (`rewind.toml` in project root)
/// 4. User config (`~/.rewind/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RewindConfig {
    pub backup: BackupConfig,
    pub rollback: RollbackConfig,
    pub statistics: StatisticsConfig,
    pub osc: OscConfig,
    pub server: ServerConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub backup_enabled: Option<bool>,
    pub batch_size: Option<usize>,
    pub minimal_update: Option<bool>,
    pub store_path: Option<String>,
}

impl RewindConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        let project_config_path = root.join("rewind.toml");
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &RewindConfig) -> Result<(), ConfigError> {
        if config.backup.batch_size == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "backup.batch_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.rollback.max_capture_rows == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "rollback.max_capture_rows".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(ref path) = config.backup.store_path {
            if path.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "backup.store_path".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".rewind").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are ignored.
    fn merge_toml_file(config: &mut RewindConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: RewindConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `Some` values in `other` win.
    fn merge(base: &mut RewindConfig, other: &RewindConfig) {
        fn take<T: Clone>(base: &mut Option<T>, other: &Option<T>) {
            if other.is_some() {
                base.clone_from(other);
            }
        }

        take(&mut base.backup.enabled, &other.backup.enabled);
        take(&mut base.backup.batch_size, &other.backup.batch_size);
        take(&mut base.backup.flush_retries, &other.backup.flush_retries);
        take(&mut base.backup.retry_backoff_ms, &other.backup.retry_backoff_ms);
        take(&mut base.backup.store_path, &other.backup.store_path);

        take(&mut base.rollback.minimal_update, &other.rollback.minimal_update);
        take(&mut base.rollback.max_capture_rows, &other.rollback.max_capture_rows);

        take(&mut base.statistics.enabled, &other.statistics.enabled);

        take(&mut base.osc.pt_osc_enabled, &other.osc.pt_osc_enabled);
        take(&mut base.osc.gh_ost_enabled, &other.osc.gh_ost_enabled);

        take(
            &mut base.server.explicit_defaults_for_timestamp,
            &other.server.explicit_defaults_for_timestamp,
        );
        take(&mut base.server.default_charset, &other.server.default_charset);
    }

    /// Apply environment variable overrides.
    /// Pattern: `REWIND_BACKUP_BATCH_SIZE`, `REWIND_ROLLBACK_MINIMAL_UPDATE`, etc.
    fn apply_env_overrides(config: &mut RewindConfig) {
        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
        }

        if let Some(v) = parsed("REWIND_BACKUP_ENABLED") {
            config.backup.enabled = Some(v);
        }
        if let Some(v) = parsed("REWIND_BACKUP_BATCH_SIZE") {
            config.backup.batch_size = Some(v);
        }
        if let Some(v) = parsed("REWIND_BACKUP_FLUSH_RETRIES") {
            config.backup.flush_retries = Some(v);
        }
        if let Ok(v) = std::env::var("REWIND_BACKUP_STORE_PATH") {
            config.backup.store_path = Some(v);
        }
        if let Some(v) = parsed("REWIND_ROLLBACK_MINIMAL_UPDATE") {
            config.rollback.minimal_update = Some(v);
        }
        if let Some(v) = parsed("REWIND_ROLLBACK_MAX_CAPTURE_ROWS") {
            config.rollback.max_capture_rows = Some(v);
        }
        if let Some(v) = parsed("REWIND_STATISTICS_ENABLED") {
            config.statistics.enabled = Some(v);
        }
        if let Some(v) = parsed("REWIND_OSC_PT_OSC_ENABLED") {
            config.osc.pt_osc_enabled = Some(v);
        }
        if let Some(v) = parsed("REWIND_OSC_GH_OST_ENABLED") {
            config.osc.gh_ost_enabled = Some(v);
        }
        if let Some(v) = parsed("REWIND_SERVER_EXPLICIT_DEFAULTS_FOR_TIMESTAMP") {
            config.server.explicit_defaults_for_timestamp = Some(v);
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut RewindConfig, cli: &CliOverrides) {
        if let Some(v) = cli.backup_enabled {
            config.backup.enabled = Some(v);
        }
        if let Some(v) = cli.batch_size {
            config.backup.batch_size = Some(v);
        }
        if let Some(v) = cli.minimal_update {
            config.rollback.minimal_update = Some(v);
        }
        if let Some(ref v) = cli.store_path {
            config.backup.store_path = Some(v.clone());
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
