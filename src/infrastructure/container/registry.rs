//! 服务注册表
//!
//! 保存 服务键 -> (生命周期, 工厂, 可选销毁能力)。注册表由宿主一次性构建，
//! 移交给 [`ServiceContainer`](super::ServiceContainer) 后即不可变，
//! 并以 `Arc` 在整棵作用域树中共享。注册表本身不包含任何解析逻辑。

use super::dispose::{Dispose, Teardown, TeardownFn};
use super::error::ContainerError;
use super::key::ServiceKey;
use super::scope::Scope;
use super::ServiceLifetime;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// 类型擦除后的服务实例，内部装的是 `Arc<T>`
pub(crate) type ErasedInstance = Arc<dyn Any + Send + Sync>;

type ErasedFactory = Arc<dyn Fn(&Scope) -> Result<ErasedInstance, ContainerError> + Send + Sync>;

type TeardownFactory = Arc<dyn Fn(&ErasedInstance) -> Option<TeardownFn> + Send + Sync>;

/// 单个服务注册
#[derive(Clone)]
pub struct Registration {
    key: ServiceKey,
    lifetime: ServiceLifetime,
    factory: ErasedFactory,
    teardown: Option<TeardownFactory>,
}

impl Registration {
    pub fn key(&self) -> ServiceKey {
        self.key
    }

    pub fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    /// 实例是否具备销毁能力
    pub fn is_disposable(&self) -> bool {
        self.teardown.is_some()
    }

    /// 以给定解析器调用工厂
    pub(crate) fn create(&self, scope: &Scope) -> Result<ErasedInstance, ContainerError> {
        (self.factory)(scope)
    }

    /// 为刚创建的实例构造销毁回调（若注册带有销毁能力）
    pub(crate) fn teardown_for(&self, instance: &ErasedInstance) -> Option<Teardown> {
        let teardown = self.teardown.as_ref()?;
        teardown(instance).map(|run| Teardown::new(self.key, run))
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("disposable", &self.is_disposable())
            .finish()
    }
}

/// 有序的服务注册表
#[derive(Default)]
pub struct Registry {
    registrations: Vec<Registration>,
    index: HashMap<ServiceKey, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册服务。同一服务键只能注册一次，重复注册返回 `DuplicateRegistration`。
    ///
    /// 工厂接收当前活动的解析器，可以通过它解析其他服务。
    /// 这里注册的实例不会被销毁，即使类型实现了 [`Dispose`]；
    /// 需要销毁的作用域服务请使用 [`Registry::register_scoped_disposable`]。
    pub fn register<T, F>(
        &mut self,
        lifetime: ServiceLifetime,
        factory: F,
    ) -> Result<&mut Self, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Scope) -> Result<Arc<T>, ContainerError> + Send + Sync + 'static,
    {
        self.insert(Registration {
            key: ServiceKey::of::<T>(),
            lifetime,
            factory: erase_factory(factory),
            teardown: None,
        })
    }

    /// 注册瞬态服务
    pub fn register_transient<T, F>(&mut self, factory: F) -> Result<&mut Self, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Scope) -> Result<Arc<T>, ContainerError> + Send + Sync + 'static,
    {
        self.register(ServiceLifetime::Transient, factory)
    }

    /// 注册作用域服务
    ///
    /// 作用域销毁时不会调用 [`Dispose::dispose`]：销毁能力只在注册时通过
    /// [`Registry::register_scoped_disposable`] 附加。
    pub fn register_scoped<T, F>(&mut self, factory: F) -> Result<&mut Self, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Scope) -> Result<Arc<T>, ContainerError> + Send + Sync + 'static,
    {
        self.register(ServiceLifetime::Scoped, factory)
    }

    /// 注册可销毁的作用域服务：作用域销毁时按创建顺序调用 [`Dispose::dispose`]
    pub fn register_scoped_disposable<T, F>(
        &mut self,
        factory: F,
    ) -> Result<&mut Self, ContainerError>
    where
        T: ?Sized + Dispose + Send + Sync + 'static,
        F: Fn(&Scope) -> Result<Arc<T>, ContainerError> + Send + Sync + 'static,
    {
        let teardown: TeardownFactory = Arc::new(|instance: &ErasedInstance| {
            let service = Arc::clone(instance.downcast_ref::<Arc<T>>()?);
            Some(Box::new(move || T::dispose(&service)) as TeardownFn)
        });

        self.insert(Registration {
            key: ServiceKey::of::<T>(),
            lifetime: ServiceLifetime::Scoped,
            factory: erase_factory(factory),
            teardown: Some(teardown),
        })
    }

    /// 按服务键查找注册
    pub fn lookup(&self, key: &ServiceKey) -> Result<&Registration, ContainerError> {
        self.index
            .get(key)
            .map(|&idx| &self.registrations[idx])
            .ok_or_else(|| ContainerError::ServiceNotRegistered {
                service: key.type_name(),
                available: self.service_names(),
            })
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.index.contains_key(&ServiceKey::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// 按注册顺序返回服务短名称
    pub fn service_names(&self) -> Vec<&'static str> {
        self.registrations.iter().map(|r| r.key.short_name()).collect()
    }

    /// 按注册顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter()
    }

    fn insert(&mut self, registration: Registration) -> Result<&mut Self, ContainerError> {
        let key = registration.key;
        if self.index.contains_key(&key) {
            return Err(ContainerError::DuplicateRegistration {
                service: key.type_name(),
            });
        }

        tracing::trace!(service = %key, lifetime = ?registration.lifetime, "service registered");
        self.index.insert(key, self.registrations.len());
        self.registrations.push(registration);
        Ok(self)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.registrations.iter()).finish()
    }
}

fn erase_factory<T, F>(factory: F) -> ErasedFactory
where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(&Scope) -> Result<Arc<T>, ContainerError> + Send + Sync + 'static,
{
    Arc::new(move |scope: &Scope| {
        let service = factory(scope)?;
        Ok(Arc::new(service) as ErasedInstance)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::container::BoxError;

    struct Plain;

    struct Closable;

    impl Dispose for Closable {
        fn dispose(&self) -> Result<(), BoxError> {
            Ok(())
        }
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = Registry::new();
        registry.register_transient(|_| Ok(Arc::new(Plain))).unwrap();

        let result = registry.register_scoped(|_| Ok(Arc::new(Plain)));
        assert!(matches!(
            result,
            Err(ContainerError::DuplicateRegistration { .. })
        ));

        // 第一次注册保持不变
        let registration = registry.lookup(&ServiceKey::of::<Plain>()).unwrap();
        assert_eq!(registration.lifetime(), ServiceLifetime::Transient);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_missing_lists_available_services() {
        let mut registry = Registry::new();
        registry
            .register_transient(|_| Ok(Arc::new(Plain)))
            .unwrap()
            .register_scoped_disposable(|_| Ok(Arc::new(Closable)))
            .unwrap();

        match registry.lookup(&ServiceKey::of::<String>()) {
            Err(ContainerError::ServiceNotRegistered { service, available }) => {
                assert_eq!(service, "alloc::string::String");
                assert_eq!(available, vec!["Plain", "Closable"]);
            }
            other => panic!("Expected ServiceNotRegistered, got {:?}", other),
        }
    }

    #[test]
    fn test_registration_metadata() {
        let mut registry = Registry::new();
        registry
            .register_scoped_disposable(|_| Ok(Arc::new(Closable)))
            .unwrap()
            .register_scoped(|_| Ok(Arc::new(Plain)))
            .unwrap();

        let closable = registry.lookup(&ServiceKey::of::<Closable>()).unwrap();
        assert!(closable.is_disposable());
        assert_eq!(closable.lifetime(), ServiceLifetime::Scoped);

        let plain = registry.lookup(&ServiceKey::of::<Plain>()).unwrap();
        assert!(!plain.is_disposable());

        assert!(registry.contains::<Plain>());
        assert!(!registry.contains::<String>());
        assert_eq!(
            registry.iter().map(|r| r.key().short_name()).collect::<Vec<_>>(),
            vec!["Closable", "Plain"]
        );
    }
}
