//! Configuration loading
//!
//! Precedence order (highest to lowest):
//! 1. Environment variable overrides
//! 2. Root config file
//! 3. Built-in defaults

use std::path::Path;

use anyhow::{Context, Result};

use super::{defaults, paths, schema::Config};
use crate::diagnostics::ColorMode;

pub const COLOR_ENV: &str = "BUNDLEDIAG_COLOR";
pub const MAX_LOG_LINES_ENV: &str = "BUNDLEDIAG_MAX_LOG_LINES";
pub const CONTROLLER_NAMESPACE_ENV: &str = "BUNDLEDIAG_CONTROLLER_NAMESPACE";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers applied
    pub fn load() -> Result<Config> {
        Self::load_from(&paths::root_config_path())
    }

    /// Load configuration from `path` (skipped when missing) plus environment
    /// overrides
    pub fn load_from(path: &Path) -> Result<Config> {
        let mut config = if path.exists() {
            Self::load_file(path)?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Self::load_defaults()
        };

        Self::apply_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the root configuration file, if there is one
    ///
    /// Fails on invalid YAML, unknown keys, wrong value types and values the
    /// diagnostics can't work with.
    pub fn validate() -> Result<()> {
        let root_path = paths::root_config_path();
        if root_path.exists() {
            Self::validate_config(&Self::load_file(&root_path)?)?;
        }

        let merged = Self::load().context("Failed to load merged configuration")?;
        Self::validate_config(&merged)
    }

    fn validate_config(config: &Config) -> Result<()> {
        if config.diagnostics.controller_namespace.trim().is_empty() {
            anyhow::bail!("diagnostics.controllerNamespace must not be empty");
        }
        if config.diagnostics.controller_deployment.trim().is_empty() {
            anyhow::bail!("diagnostics.controllerDeployment must not be empty");
        }
        Ok(())
    }

    /// Save configuration to the root config file
    pub fn save(config: &Config) -> Result<()> {
        Self::save_to(config, &paths::root_config_path())
    }

    pub fn save_to(config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        defaults::default_config()
    }

    /// Apply environment variable overrides, read through `lookup`
    fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(color) = lookup(COLOR_ENV) {
            match color.parse::<ColorMode>() {
                Ok(mode) => config.ui.color = mode,
                Err(e) => tracing::warn!("Ignoring {}: {}", COLOR_ENV, e),
            }
        }

        if let Some(lines) = lookup(MAX_LOG_LINES_ENV) {
            match lines.parse::<usize>() {
                Ok(n) => config.diagnostics.max_log_lines = n,
                Err(_) => tracing::warn!(
                    "Ignoring {}: {:?} is not a number",
                    MAX_LOG_LINES_ENV,
                    lines
                ),
            }
        }

        if let Some(namespace) = lookup(CONTROLLER_NAMESPACE_ENV) {
            config.diagnostics.controller_namespace = namespace;
        }
    }
}
