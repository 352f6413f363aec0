pub mod app_config;
pub mod container_config;
pub mod logging_config;
pub mod loader;

// Re-export commonly used types
pub use app_config::{default_config_path, AppConfig, CONFIG_FILE_NAME};
pub use container_config::ContainerConfig;
pub use loader::ConfigLoader;
pub use logging_config::LoggingSection;
