//! Configuration system for bundlediag
//!
//! A single YAML file under the user config directory, layered over built-in
//! defaults and overridden by `BUNDLEDIAG_*` environment variables.

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{Config, DiagnosticsConfig, UiConfig};

use anyhow::Context;

use crate::diagnostics::ColorMode;

/// Keys accepted by `get_config_value` and `set_config_value`
pub const CONFIG_KEYS: &[&str] = &[
    "diagnostics.controllerNamespace",
    "diagnostics.controllerDeployment",
    "diagnostics.maxLogLines",
    "ui.color",
];

/// Get a configuration value by key (dot notation)
pub fn get_config_value(config: &Config, key: &str) -> anyhow::Result<String> {
    match key {
        "diagnostics.controllerNamespace" => Ok(config.diagnostics.controller_namespace.clone()),
        "diagnostics.controllerDeployment" => {
            Ok(config.diagnostics.controller_deployment.clone())
        }
        "diagnostics.maxLogLines" => Ok(config.diagnostics.max_log_lines.to_string()),
        "ui.color" => Ok(config.ui.color.to_string()),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

/// Set a configuration value by key (dot notation)
pub fn set_config_value(config: &mut Config, key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        "diagnostics.controllerNamespace" => {
            config.diagnostics.controller_namespace = value.to_string();
        }
        "diagnostics.controllerDeployment" => {
            config.diagnostics.controller_deployment = value.to_string();
        }
        "diagnostics.maxLogLines" => {
            config.diagnostics.max_log_lines = value
                .parse()
                .context("diagnostics.maxLogLines must be a number")?;
        }
        "ui.color" => {
            config.ui.color = value
                .parse::<ColorMode>()
                .map_err(|e| anyhow::anyhow!("ui.color: {}", e))?;
        }
        _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }

    Ok(())
}
