//! 基础设施层
//!
//! 提供依赖注入容器的具体实现

// 容器实现
pub mod container;

// 重新导出API
pub use container::{
    ContainerError, Dispose, Registry, Scope, ServiceContainer, ServiceLifetime,
};
