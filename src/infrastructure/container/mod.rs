//! 依赖注入容器
//!
//! 提供显式的 `(服务键, 生命周期, 工厂)` 注册与解析，支持：
//! - 瞬态模式：每次解析创建新实例
//! - 作用域模式：同一作用域内共享实例，不同作用域互相隔离
//! - 嵌套作用域与按创建顺序的确定性销毁
//! - 循环依赖检测

mod dispose;
mod error;
mod key;
mod registry;
mod root;
mod scope;
mod stats;

pub use dispose::Dispose;
pub use error::{BoxError, ContainerError, DisposalFailure};
pub use key::ServiceKey;
pub use registry::{Registration, Registry};
pub use root::ServiceContainer;
pub use scope::{Scope, ScopeInfo, ScopeState};
pub use stats::ContainerStats;

/// 服务生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceLifetime {
    /// 瞬态 - 每次请求都创建新实例，调用方持有，容器不跟踪销毁
    Transient,
    /// 作用域 - 在所属作用域内共享实例，随作用域销毁
    Scoped,
}

impl std::fmt::Display for ServiceLifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceLifetime::Transient => f.write_str("transient"),
            ServiceLifetime::Scoped => f.write_str("scoped"),
        }
    }
}
