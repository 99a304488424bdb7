use serde::{Deserialize, Serialize};

use crate::{common::ConfigError, configs::*};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
  #[serde(default)]
  pub nodes: Vec<NodeConfig>,
  #[serde(default)]
  pub session: SessionDefaults,
  pub logging: Option<LoggingConfig>,
}

impl Config {
  pub fn load() -> Result<Self, ConfigError> {
    let config_path = if std::path::Path::new("config.toml").exists() {
      "config.toml"
    } else if std::path::Path::new("config.default.toml").exists() {
      "config.default.toml"
    } else {
      return Err(ConfigError::NotFound);
    };

    tracing::info!("Loading configuration from: {}", config_path);

    let config_str = std::fs::read_to_string(config_path)?;
    if config_str.trim().is_empty() {
      return Err(ConfigError::Empty(config_path.to_string()));
    }

    Self::from_toml_str(&config_str)
  }

  pub fn from_toml_str(config_str: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(config_str)?)
  }
}
