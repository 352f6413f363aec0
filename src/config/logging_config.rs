use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::errors::ConfigError;
use crate::logging::LogFormat;

pub const ENV_LOG_LEVEL: &str = "LIFETIME_DI_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "LIFETIME_DI_LOG_FORMAT";

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Logging section of the configuration file
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggingSection {
    /// Default level (`RUST_LOG` still takes precedence at runtime)
    pub level: String,
    pub format: LogFormat,
}

/// Partial Logging Configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialLoggingSection {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingSection {
    /// Create LoggingSection from environment variables and file config
    pub fn from_env_or_file(
        partial: Option<PartialLoggingSection>,
        env_map: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();

        let level = env_map
            .get(ENV_LOG_LEVEL)
            .cloned()
            .or(partial.level)
            .unwrap_or_else(default_level);
        let level = validate_level(&level)?;

        let format = match env_map.get(ENV_LOG_FORMAT) {
            Some(value) => value.parse()?,
            None => partial.format.unwrap_or_default(),
        };

        Ok(Self { level, format })
    }
}

/// Normalise a level name, rejecting unknown ones
pub fn validate_level(level: &str) -> Result<String, ConfigError> {
    let normalised = level.trim().to_ascii_lowercase();
    if LEVELS.contains(&normalised.as_str()) {
        Ok(normalised)
    } else {
        Err(ConfigError::invalid(
            "logging.level",
            level,
            "one of trace, debug, info, warn, error",
        ))
    }
}

fn default_level() -> String {
    "info".to_string()
}
