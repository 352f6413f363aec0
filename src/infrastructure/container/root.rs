//! 根容器

use super::error::ContainerError;
use super::registry::Registry;
use super::scope::{Scope, ScopeInfo, TreeShared};
use super::stats::ContainerStats;
use crate::config::ContainerConfig;
use std::sync::Arc;

/// 依赖注入容器
///
/// 持有根作用域。根作用域与子作用域遵循相同的解析契约；
/// 容器被丢弃时如果尚未销毁，会销毁根作用域（级联开启时连同整棵树）。
pub struct ServiceContainer {
    root: Scope,
}

impl ServiceContainer {
    /// 使用默认配置创建容器。注册表从此不可变。
    pub fn new(registry: Registry) -> Self {
        Self::with_config(registry, ContainerConfig::default())
    }

    /// 使用给定配置创建容器
    pub fn with_config(registry: Registry, config: ContainerConfig) -> Self {
        tracing::debug!(
            root = %config.root_name,
            services = registry.len(),
            cascade_dispose = config.cascade_dispose,
            "service container created"
        );

        Self {
            root: Scope::new_root(TreeShared::new(registry, config)),
        }
    }

    /// 在根作用域中解析服务
    pub fn resolve<T>(&self) -> Result<Arc<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.root.resolve::<T>()
    }

    /// 创建根作用域的子作用域
    pub fn create_scope(&self) -> Result<Scope, ContainerError> {
        self.root.create_scope()
    }

    /// 创建命名子作用域
    pub fn create_named_scope(&self, name: impl Into<String>) -> Result<Scope, ContainerError> {
        self.root.create_named_scope(name)
    }

    /// 在新的子作用域中执行闭包，结束后销毁该作用域
    ///
    /// 销毁失败时返回 `DisposalFailed`，闭包的返回值随之丢弃。
    pub fn with_scope<R>(&self, f: impl FnOnce(&Scope) -> R) -> Result<R, ContainerError> {
        self.root.with_scope(f)
    }

    /// 销毁根作用域
    pub fn dispose(&self) -> Result<(), ContainerError> {
        self.root.dispose()
    }

    pub fn is_disposed(&self) -> bool {
        self.root.is_disposed()
    }

    /// 根作用域句柄
    pub fn root(&self) -> &Scope {
        &self.root
    }

    pub fn registry(&self) -> &Registry {
        self.root.registry()
    }

    /// 检查服务是否已注册
    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.registry().contains::<T>()
    }

    /// 获取根作用域信息
    pub fn root_info(&self) -> ScopeInfo {
        self.root.info()
    }

    /// 获取容器统计信息
    pub fn get_stats(&self) -> ContainerStats {
        self.root.stats()
    }

    /// 获取容器性能摘要
    pub fn get_performance_summary(&self) -> String {
        self.get_stats().performance_summary()
    }
}

impl Drop for ServiceContainer {
    fn drop(&mut self) {
        if let Err(error) = self.root.dispose() {
            tracing::warn!(%error, "container teardown reported failures");
        }
    }
}

impl std::fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("root", &self.root)
            .field("registry", self.registry())
            .finish()
    }
}
