use std::{collections::HashMap, env, fs, path::PathBuf};
use crate::errors::ConfigError;

use super::app_config::{default_config_path, AppConfig, PartialAppConfig};

/// Prefix of the environment variables the loader collects
pub const ENV_PREFIX: &str = "LIFETIME_DI_";

/// Configuration loader responsible for loading config from files and environment
pub struct ConfigLoader {
    path: Option<PathBuf>,
    explicit: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new config loader using the default per-user location.
    /// A missing file there simply means "use defaults".
    pub fn new() -> Self {
        Self {
            path: default_config_path(),
            explicit: false,
        }
    }

    /// Create a config loader for an explicit file; the file must exist
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            explicit: true,
        }
    }

    /// Load complete application configuration
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let env_map = Self::collect_env_vars();
        self.load_config_with_env(&env_map)
    }

    /// Load configuration with a caller-supplied environment (for testing)
    pub fn load_config_with_env(
        &self,
        env_map: &HashMap<String, String>,
    ) -> Result<AppConfig, ConfigError> {
        let partial = self.load_partial_config()?;
        AppConfig::from_partial_and_env(partial, env_map)
    }

    fn load_partial_config(&self) -> Result<Option<PartialAppConfig>, ConfigError> {
        let Some(path) = &self.path else {
            tracing::debug!("no configuration directory on this platform, using defaults");
            return Ok(None);
        };

        if !path.exists() && !self.explicit {
            tracing::debug!("configuration file {:?} not found, using defaults", path);
            return Ok(None);
        }

        let shown = path.display().to_string();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(shown.clone(), e))?;
        let partial =
            toml::from_str(&content).map_err(|e| ConfigError::TomlParse(shown.clone(), e))?;

        tracing::info!(path = %shown, "loaded configuration");
        Ok(Some(partial))
    }

    /// Collect the `LIFETIME_DI_*` environment variables
    fn collect_env_vars() -> HashMap<String, String> {
        env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[container]\nroot_name = \"pond\"\n\n[logging]\nlevel = \"debug\"\nformat = \"json\""
        )
        .unwrap();

        let loader = ConfigLoader::with_path(file.path().to_path_buf());
        let config = loader.load_config_with_env(&HashMap::new()).unwrap();

        assert_eq!(config.container.root_name, "pond");
        assert!(config.container.cascade_dispose);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::with_path(dir.path().join("missing.toml"));

        let result = loader.load_config_with_env(&HashMap::new());
        assert!(matches!(result, Err(ConfigError::FileRead(..))));
    }

    #[test]
    fn test_invalid_toml_is_reported_with_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[container\nroot_name = ").unwrap();

        let loader = ConfigLoader::with_path(file.path().to_path_buf());
        match loader.load_config_with_env(&HashMap::new()) {
            Err(ConfigError::TomlParse(path, _)) => {
                assert_eq!(path, file.path().display().to_string());
            }
            other => panic!("Expected TomlParse error, got {:?}", other),
        }
    }
}
