// crates/release-ledger-config/src/config.rs
// ============================================================================
// Module: Release Ledger Configuration
// Description: Configuration loading and validation for Release Ledger.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: release-ledger-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path
//! limits. Unknown keys, out-of-range values, and oversized files fail
//! closed; the resolved model converts into the explicit [`RunSettings`]
//! struct the run engine consumes, so no component reads ambient state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use release_ledger_core::FeatureToggles;
use release_ledger_core::RunSettings;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "release-ledger.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "RELEASE_LEDGER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of the QA environment alias.
pub(crate) const MAX_QA_ALIAS_LENGTH: usize = 64;
/// Maximum promotion window in hours (28 days).
pub(crate) const MAX_PROMOTION_WINDOW_HOURS: u32 = 672;
/// Maximum retention horizon in days (ten years).
pub(crate) const MAX_RETENTION_DAYS: u32 = 3_650;
/// Default retention horizon in days.
pub(crate) const DEFAULT_RETENTION_DAYS: u32 = 90;
/// Default promotion window in hours.
pub(crate) const DEFAULT_PROMOTION_WINDOW_HOURS: u32 = 24;
/// Default days between retention passes.
pub(crate) const DEFAULT_CLEANUP_INTERVAL_DAYS: u32 = 7;
/// Default store root directory.
pub(crate) const DEFAULT_STORE_ROOT: &str = "ledger-state";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Release Ledger configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseLedgerConfig {
    /// Run behavior configuration.
    #[serde(default)]
    pub run: RunConfig,
    /// Store layout and retention configuration.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Run behavior configuration section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Enables the PR-to-branch enrichment stage.
    #[serde(default = "default_true")]
    pub branch_enrichment: bool,
    /// Enables the time-aware build-driven path.
    #[serde(default = "default_true")]
    pub time_aware_builds: bool,
    /// Promotion-heuristic window in hours.
    #[serde(default = "default_promotion_window_hours")]
    pub promotion_window_hours: u32,
    /// Optional exact-match environment alias classified as QA.
    #[serde(default)]
    pub qa_env_alias: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            branch_enrichment: true,
            time_aware_builds: true,
            promotion_window_hours: DEFAULT_PROMOTION_WINDOW_HOURS,
            qa_env_alias: None,
        }
    }
}

impl RunConfig {
    /// Validates the run section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.promotion_window_hours == 0 {
            return Err(ConfigError::Invalid(
                "run.promotion_window_hours must be greater than zero".to_string(),
            ));
        }
        if self.promotion_window_hours > MAX_PROMOTION_WINDOW_HOURS {
            return Err(ConfigError::Invalid(format!(
                "run.promotion_window_hours exceeds max ({MAX_PROMOTION_WINDOW_HOURS})"
            )));
        }
        if let Some(alias) = &self.qa_env_alias {
            let trimmed = alias.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::Invalid(
                    "run.qa_env_alias must be non-empty when set".to_string(),
                ));
            }
            if trimmed.len() > MAX_QA_ALIAS_LENGTH {
                return Err(ConfigError::Invalid(format!(
                    "run.qa_env_alias exceeds max length ({MAX_QA_ALIAS_LENGTH})"
                )));
            }
        }
        Ok(())
    }
}

/// Store layout and retention configuration section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Root directory for all persisted state.
    #[serde(default = "default_store_root")]
    pub root: String,
    /// Retention horizon in days; `0` disables retention.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Minimum days between retention passes.
    #[serde(default = "default_cleanup_interval_days")]
    pub cleanup_interval_days: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_STORE_ROOT.to_string(),
            retention_days: DEFAULT_RETENTION_DAYS,
            cleanup_interval_days: DEFAULT_CLEANUP_INTERVAL_DAYS,
        }
    }
}

impl StoreConfig {
    /// Validates the store section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("store.root", &self.root)?;
        if self.retention_days > MAX_RETENTION_DAYS {
            return Err(ConfigError::Invalid(format!(
                "store.retention_days exceeds max ({MAX_RETENTION_DAYS})"
            )));
        }
        if self.cleanup_interval_days == 0 {
            return Err(ConfigError::Invalid(
                "store.cleanup_interval_days must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the store root as a path.
    #[must_use]
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(self.root.trim())
    }
}

impl ReleaseLedgerConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit path, then the `RELEASE_LEDGER_CONFIG`
    /// environment variable, then `release-ledger.toml` in the working
    /// directory. A missing file at the default location yields the
    /// default configuration; an explicitly named missing file is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path.is_some() || env::var(CONFIG_ENV_VAR).is_ok();
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = match fs::read(&resolved) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && !explicit => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(err) => return Err(ConfigError::Io(err.to_string())),
        };
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.run.validate()?;
        self.store.validate()?;
        Ok(())
    }

    /// Converts the configuration into the engine's per-run settings.
    #[must_use]
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            toggles: FeatureToggles {
                branch_enrichment: self.run.branch_enrichment,
                time_aware_builds: self.run.time_aware_builds,
            },
            qa_env_alias: self.run.qa_env_alias.as_ref().map(|alias| alias.trim().to_string()),
            promotion_window_hours: self.run.promotion_window_hours,
            retention_days: self.store.retention_days,
            cleanup_interval_days: self.store.cleanup_interval_days,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default for boolean toggles that ship enabled.
const fn default_true() -> bool {
    true
}

/// Default promotion window in hours.
const fn default_promotion_window_hours() -> u32 {
    DEFAULT_PROMOTION_WINDOW_HOURS
}

/// Default retention horizon in days.
const fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

/// Default days between retention passes.
const fn default_cleanup_interval_days() -> u32 {
    DEFAULT_CLEANUP_INTERVAL_DAYS
}

/// Default store root directory.
fn default_store_root() -> String {
    DEFAULT_STORE_ROOT.to_string()
}

/// Resolves the config path from the explicit argument or environment.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}
