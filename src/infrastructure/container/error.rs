//! 容器错误类型

use thiserror::Error;

/// 工厂与销毁回调使用的装箱错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 依赖注入容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 同一服务键重复注册
    #[error("Service '{service}' is already registered")]
    DuplicateRegistration { service: &'static str },

    /// 服务未注册 - 包含当前已注册的服务列表
    #[error("Service '{service}' is not registered{}", format_available(.available))]
    ServiceNotRegistered {
        service: &'static str,
        available: Vec<&'static str>,
    },

    /// 作用域已销毁（或正在销毁）
    #[error("Scope '{scope}' is disposed, cannot {operation}")]
    ScopeDisposed {
        scope: String,
        operation: &'static str,
    },

    /// 循环依赖：工厂在返回之前再次解析了自身
    #[error("Circular dependency detected: {}", .chain.join(" -> "))]
    CircularDependency { chain: Vec<&'static str> },

    /// 工厂返回了领域错误
    #[error("Failed to create service '{service}': {source}")]
    CreationFailed {
        service: &'static str,
        #[source]
        source: BoxError,
    },

    /// 缓存的实例与服务键类型不符
    #[error("Type cast failed: expected '{expected}' in {context}")]
    TypeCastFailed {
        expected: &'static str,
        context: String,
    },

    /// 销毁过程中至少一个销毁回调失败（其余回调均已执行）
    #[error("Scope '{scope}' disposed with {} failure(s): {}", .failures.len(), format_failures(.failures))]
    DisposalFailed {
        scope: String,
        failures: Vec<DisposalFailure>,
    },
}

impl ContainerError {
    /// 将任意领域错误包装为 `CreationFailed`
    pub fn creation_failed<T: ?Sized, E>(source: E) -> Self
    where
        E: Into<BoxError>,
    {
        ContainerError::CreationFailed {
            service: std::any::type_name::<T>(),
            source: source.into(),
        }
    }

    /// 是否为作用域已销毁错误
    pub fn is_scope_disposed(&self) -> bool {
        matches!(self, ContainerError::ScopeDisposed { .. })
    }
}

/// 单个销毁回调的失败记录
#[derive(Debug)]
pub struct DisposalFailure {
    /// 实例所属作用域名称
    pub scope: String,
    /// 服务类型名称
    pub service: &'static str,
    pub error: BoxError,
}

impl std::fmt::Display for DisposalFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} in '{}': {}", self.service, self.scope, self.error)
    }
}

fn format_available(available: &[&'static str]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(". Available services: {}", available.join(", "))
    }
}

fn format_failures(failures: &[DisposalFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_registered_message_lists_available() {
        let err = ContainerError::ServiceNotRegistered {
            service: "Duck",
            available: vec!["Feeder", "FoodList"],
        };
        assert_eq!(
            err.to_string(),
            "Service 'Duck' is not registered. Available services: Feeder, FoodList"
        );

        let empty = ContainerError::ServiceNotRegistered {
            service: "Duck",
            available: Vec::new(),
        };
        assert_eq!(empty.to_string(), "Service 'Duck' is not registered");
    }

    #[test]
    fn test_circular_dependency_message() {
        let err = ContainerError::CircularDependency {
            chain: vec!["A", "B", "A"],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: A -> B -> A");
    }

    #[test]
    fn test_creation_failed_keeps_source() {
        let err = ContainerError::creation_failed::<String, _>("boom");
        assert!(err.to_string().contains("boom"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
