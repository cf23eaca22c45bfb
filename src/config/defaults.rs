//! Default configuration values

use super::schema::Config;

/// Get the default configuration
pub fn default_config() -> Config {
    Config::default()
}

/// Default configuration rendered as YAML, for `config list` on a fresh install
pub fn default_config_yaml() -> anyhow::Result<String> {
    serde_yaml::to_string(&default_config())
        .map_err(|e| anyhow::anyhow!("Failed to serialize default configuration: {}", e))
}
