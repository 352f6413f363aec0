//! 销毁能力
//!
//! 任何服务类型都可以选择实现 [`Dispose`]。作用域只在缓存作用域实例时
//! 检查注册上是否附带了该能力，并按创建顺序登记到销毁列表。

use super::error::BoxError;
use super::key::ServiceKey;

/// 可被拆除的服务
pub trait Dispose: Send + Sync {
    /// 释放资源。由所属作用域在销毁时调用，且只调用一次。
    fn dispose(&self) -> Result<(), BoxError>;
}

/// 一次性的拆除回调
pub(crate) type TeardownFn = Box<dyn FnOnce() -> Result<(), BoxError> + Send>;

/// 销毁列表中的一项
pub(crate) struct Teardown {
    pub(crate) key: ServiceKey,
    run: TeardownFn,
}

impl Teardown {
    pub(crate) fn new(key: ServiceKey, run: TeardownFn) -> Self {
        Self { key, run }
    }

    /// 消耗自身执行拆除，保证至多一次
    pub(crate) fn run(self) -> Result<(), BoxError> {
        (self.run)()
    }
}

impl std::fmt::Debug for Teardown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Teardown").field("key", &self.key).finish()
    }
}
