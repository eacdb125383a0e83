//! Configuration for registries and executions.
//!
//! Settings are plain serde structs, so they can be built in code or loaded
//! from TOML:
//!
//! ```toml
//! [registry]
//! late_registration = "ignore"
//! precompile_on_seal = true
//!
//! [execution]
//! rollback_on_failure = true
//! log_level = "debug"
//! ```
//!
//! Every field is optional and falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::callback::LogLevel;
use crate::error::Result;

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Root configuration structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CadenceConfig {
    /// Callback registry settings.
    pub registry: RegistryConfig,
    /// Per-execution settings.
    pub execution: ExecutionConfig,
}

impl CadenceConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TomlParse`] for malformed TOML or unknown keys.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Render as a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TomlSerialize`] if serialization fails.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// What to do with a registration arriving after the registry was sealed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LateRegistration {
    /// Return [`Error::RegistrySealed`](crate::Error::RegistrySealed).
    #[default]
    Reject,
    /// Log a warning and drop the callback.
    Ignore,
}

/// Callback registry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Handling of registrations after `seal`.
    pub late_registration: LateRegistration,
    /// Compile every dispatch chain when the registry is sealed.
    pub precompile_on_seal: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            late_registration: LateRegistration::Reject,
            precompile_on_seal: true,
        }
    }
}

/// Per-execution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Roll back an open transaction when the run fails or errors.
    pub rollback_on_failure: bool,
    /// Level of the per-execution start and finish events.
    pub log_level: LogLevel,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            rollback_on_failure: true,
            log_level: LogLevel::Info,
        }
    }
}

/// Load configuration from a specific path.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// Returns [`crate::Error::Config`] if the file cannot be read or parsed.
pub async fn load_config_from(path: impl AsRef<Path>) -> Result<CadenceConfig> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
        return Ok(CadenceConfig::default());
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(ConfigError::from)?;
    let config = CadenceConfig::from_toml_str(&content)?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

/// Save configuration to a specific path.
///
/// # Errors
///
/// Returns [`crate::Error::Config`] if the directory or file cannot be written.
pub async fn save_config_to(config: &CadenceConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(ConfigError::from)?;
    }

    let content = config.to_toml_string()?;
    tokio::fs::write(path, content)
        .await
        .map_err(ConfigError::from)?;
    info!(path = %path.display(), "saved config file");

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("cadence-{}", uuid::Uuid::new_v4()))
            .join("config.toml")
    }

    #[test]
    fn defaults() {
        let config = CadenceConfig::default();
        assert_eq!(config.registry.late_registration, LateRegistration::Reject);
        assert!(config.registry.precompile_on_seal);
        assert!(config.execution.rollback_on_failure);
        assert_eq!(config.execution.log_level, LogLevel::Info);
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config = CadenceConfig::from_toml_str(
            r#"
            [registry]
            late_registration = "ignore"

            [execution]
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.registry.late_registration, LateRegistration::Ignore);
        assert!(config.registry.precompile_on_seal);
        assert!(config.execution.rollback_on_failure);
        assert_eq!(config.execution.log_level, LogLevel::Debug);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(
            CadenceConfig::from_toml_str("").unwrap(),
            CadenceConfig::default()
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CadenceConfig::from_toml_str("[registry]\nsealed = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let config = load_config_from(scratch_path()).await.unwrap();
        assert_eq!(config, CadenceConfig::default());
    }

    #[tokio::test]
    async fn save_then_load() {
        let path = scratch_path();
        let mut config = CadenceConfig::default();
        config.execution.rollback_on_failure = false;
        config.registry.precompile_on_seal = false;

        save_config_to(&config, &path).await.unwrap();
        let loaded = load_config_from(&path).await.unwrap();
        assert_eq!(loaded, config);

        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }

    #[tokio::test]
    async fn malformed_file_is_a_config_error() {
        let path = scratch_path();
        let dir = path.parent().unwrap();
        tokio::fs::create_dir_all(dir).await.unwrap();
        tokio::fs::write(&path, "[execution]
log_level = 3
")
            .await
            .unwrap();

        let err = load_config_from(&path).await.unwrap_err();
        assert!(matches!(err, crate::Error::Config(ConfigError::TomlParse(_))));

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
