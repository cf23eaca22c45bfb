//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{AnalyzerSettings, ColorMode, RenderConfig};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Diagnostic traversal settings
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    /// Output settings
    #[serde(default)]
    pub ui: UiConfig,
}

/// Diagnostic traversal settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Namespace of the infrastructure controller whose logs are correlated
    #[serde(default = "default_controller_namespace")]
    pub controller_namespace: String,

    /// Deployment name of the infrastructure controller
    #[serde(default = "default_controller_deployment")]
    pub controller_deployment: String,

    /// Trailing log lines attached to a finding (0 = all)
    #[serde(default = "default_max_log_lines")]
    pub max_log_lines: usize,
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UiConfig {
    /// auto, always or never
    #[serde(default)]
    pub color: ColorMode,
}

fn default_controller_namespace() -> String {
    "capt-system".to_string()
}

fn default_controller_deployment() -> String {
    "capt-controller-manager".to_string()
}

fn default_max_log_lines() -> usize {
    10
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            controller_namespace: default_controller_namespace(),
            controller_deployment: default_controller_deployment(),
            max_log_lines: default_max_log_lines(),
        }
    }
}

impl Config {
    pub fn analyzer_settings(&self) -> AnalyzerSettings {
        AnalyzerSettings {
            controller_namespace: self.diagnostics.controller_namespace.clone(),
            controller_deployment: self.diagnostics.controller_deployment.clone(),
            max_log_lines: self.diagnostics.max_log_lines,
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig::from_mode(self.ui.color)
    }
}
