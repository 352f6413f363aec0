pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod logging;
pub mod sample;

// Re-export commonly used items for convenience
pub use config::{AppConfig, ContainerConfig};
pub use errors::{ConfigError, ContainerError};
pub use infrastructure::container::{
    BoxError, ContainerStats, Dispose, Registry, Scope, ScopeInfo, ScopeState, ServiceContainer,
    ServiceKey, ServiceLifetime,
};
