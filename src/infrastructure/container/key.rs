//! 服务键
//!
//! 以被请求的类型标识一个注册。`dyn Trait` 同样是合法的键，
//! 因此同一个具体服务可以经由工厂委托暴露在多个能力键之下。

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 服务键：类型ID + 类型名称（仅用于诊断）
#[derive(Clone, Copy)]
pub struct ServiceKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl ServiceKey {
    /// 获取类型 `T` 的服务键
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// 完整类型名称，例如 `lifetime_di::sample::Duck`
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// 去掉模块路径的短名称，用于日志
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }
}

// 相等性只看 TypeId，名称不参与比较
impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({})", self.type_name)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// `a::b::Duck` -> `Duck`；`dyn` 与泛型类型保持完整名称
fn short_type_name(full: &'static str) -> &'static str {
    if full.starts_with("dyn ") || full.contains('<') {
        return full;
    }
    match full.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}
