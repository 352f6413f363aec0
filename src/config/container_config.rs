use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::errors::{parse_bool, ConfigError};

pub const ENV_ROOT_NAME: &str = "LIFETIME_DI_ROOT_NAME";
pub const ENV_CASCADE_DISPOSE: &str = "LIFETIME_DI_CASCADE_DISPOSE";

/// Container behaviour shared by every scope of one tree
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Name given to the root scope (shows up in logs and errors)
    pub root_name: String,

    /// Whether disposing a scope also disposes its live child scopes
    pub cascade_dispose: bool,
}

/// Partial Container Configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialContainerConfig {
    pub root_name: Option<String>,
    pub cascade_dispose: Option<bool>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            root_name: default_root_name(),
            cascade_dispose: default_cascade_dispose(),
        }
    }
}

impl ContainerConfig {
    /// Create ContainerConfig from environment variables and file config
    pub fn from_env_or_file(
        partial: Option<PartialContainerConfig>,
        env_map: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();

        let root_name = env_map
            .get(ENV_ROOT_NAME)
            .cloned()
            .or(partial.root_name)
            .unwrap_or_else(default_root_name);

        if root_name.trim().is_empty() {
            return Err(ConfigError::invalid("root_name", &root_name, "a non-empty name"));
        }

        let cascade_dispose = match env_map.get(ENV_CASCADE_DISPOSE) {
            Some(value) => parse_bool(ENV_CASCADE_DISPOSE, value)?,
            None => partial.cascade_dispose.unwrap_or_else(default_cascade_dispose),
        };

        Ok(Self {
            root_name,
            cascade_dispose,
        })
    }
}

fn default_root_name() -> String {
    "root".to_string()
}

fn default_cascade_dispose() -> bool {
    true
}
