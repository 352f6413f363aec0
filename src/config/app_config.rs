use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf};
use crate::errors::ConfigError;

use super::{
    container_config::{ContainerConfig, PartialContainerConfig},
    logging_config::{LoggingSection, PartialLoggingSection},
    loader::ConfigLoader,
};

// Configuration location constants
pub const USER_CONFIG_DIR: &str = "lifetime-di";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Main Application Configuration
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub container: ContainerConfig,
    pub logging: LoggingSection,
}

/// Partial Application Configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialAppConfig {
    container: Option<PartialContainerConfig>,
    logging: Option<PartialLoggingSection>,
}

impl AppConfig {
    /// Load configuration from the default file location and environment
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load_config()
    }

    /// Load configuration from an explicit file (must exist)
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        ConfigLoader::with_path(path).load_config()
    }

    /// Create AppConfig from partial config and environment
    pub fn from_partial_and_env(
        partial: Option<PartialAppConfig>,
        env_map: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();

        let container = ContainerConfig::from_env_or_file(partial.container, env_map)?;
        let logging = LoggingSection::from_env_or_file(partial.logging, env_map)?;

        Ok(AppConfig { container, logging })
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Default configuration file path, `None` when the platform has no config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(USER_CONFIG_DIR).join(CONFIG_FILE_NAME))
}
