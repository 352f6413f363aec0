//! 作用域与解析引擎
//!
//! 每个作用域拥有私有的实例缓存与销毁列表，从不与父作用域或兄弟作用域共享。
//! 根作用域由 [`ServiceContainer`](super::ServiceContainer) 持有，子作用域可以任意嵌套。
//!
//! 状态机：`Active -> Disposing -> Disposed`，单向。进入 `Disposing` 之后，
//! 任何尚未提交的解析都会以 `ScopeDisposed` 失败。

use super::dispose::Teardown;
use super::error::{ContainerError, DisposalFailure};
use super::key::ServiceKey;
use super::registry::{ErasedInstance, Registration, Registry};
use super::stats::{ContainerStats, StatsCounters};
use super::ServiceLifetime;
use crate::config::ContainerConfig;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// 作用域状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// 可以解析服务、创建子作用域
    Active,
    /// 正在执行销毁回调
    Disposing,
    /// 已销毁，不能继续使用
    Disposed,
}

/// 作用域信息快照
#[derive(Debug, Clone)]
pub struct ScopeInfo {
    /// 作用域ID
    pub id: Uuid,
    /// 作用域名称
    pub name: String,
    /// 父作用域ID（根作用域为 None）
    pub parent_id: Option<Uuid>,
    /// 嵌套深度，根作用域为 0
    pub depth: usize,
    pub state: ScopeState,
    /// 创建时间
    pub created_at: Instant,
    /// 销毁完成时间
    pub disposed_at: Option<Instant>,
    /// 仍处于活动状态的子作用域数量
    pub child_count: usize,
    /// 已缓存的作用域实例数量
    pub scoped_instances: usize,
    /// 待执行的销毁回调数量
    pub pending_disposals: usize,
}

impl ScopeInfo {
    /// 作用域存活时长（未销毁时计到当前时刻）
    pub fn duration(&self) -> Duration {
        match self.disposed_at {
            Some(end) => end - self.created_at,
            None => self.created_at.elapsed(),
        }
    }

    /// 检查作用域是否有效
    pub fn is_active(&self) -> bool {
        self.state == ScopeState::Active
    }
}

/// 整棵作用域树共享的状态
pub(crate) struct TreeShared {
    pub(crate) registry: Arc<Registry>,
    pub(crate) config: ContainerConfig,
    pub(crate) stats: StatsCounters,
    scope_seq: AtomicU64,
}

impl TreeShared {
    pub(crate) fn new(registry: Registry, config: ContainerConfig) -> Arc<Self> {
        Arc::new(Self {
            registry: Arc::new(registry),
            config,
            stats: StatsCounters::default(),
            scope_seq: AtomicU64::new(0),
        })
    }

    fn next_scope_seq(&self) -> u64 {
        self.scope_seq.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// 受锁保护的作用域可变状态
struct ScopeCache {
    status: ScopeState,
    disposed_at: Option<Instant>,
    /// 每个服务键一个 OnceCell，保证同一作用域内工厂至多执行一次
    instances: HashMap<ServiceKey, Arc<OnceCell<ErasedInstance>>>,
    /// 按创建顺序排列的销毁回调
    teardowns: Vec<Teardown>,
    /// 子作用域，按创建顺序
    children: Vec<Weak<ScopeInner>>,
}

struct ScopeInner {
    id: Uuid,
    name: String,
    parent_id: Option<Uuid>,
    depth: usize,
    created_at: Instant,
    shared: Arc<TreeShared>,
    cache: Mutex<ScopeCache>,
    /// 正在解析中的服务键（按线程区分），用于循环依赖检测
    resolving: Mutex<Vec<(ThreadId, ServiceKey)>>,
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        let cache = self.cache.get_mut();
        if cache.status != ScopeState::Active {
            return;
        }
        cache.status = ScopeState::Disposed;
        cache.disposed_at = Some(Instant::now());
        self.shared.stats.record_scope_disposed();

        if cache.teardowns.is_empty() {
            return;
        }

        tracing::warn!(
            scope = %self.name,
            pending = cache.teardowns.len(),
            "scope dropped without dispose, running teardowns"
        );
        for teardown in cache.teardowns.drain(..) {
            let key = teardown.key;
            let result = teardown.run();
            self.shared.stats.record_teardown(result.is_ok());
            if let Err(error) = result {
                tracing::warn!(scope = %self.name, service = %key, %error, "teardown failed");
            }
        }
    }
}

/// 解析器：根容器与子作用域共享的解析契约
///
/// `Scope` 是廉价的句柄，克隆后指向同一个作用域。
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    pub(crate) fn new_root(shared: Arc<TreeShared>) -> Self {
        let name = shared.config.root_name.clone();
        Self::from_parts(shared, name, None, 0)
    }

    fn from_parts(
        shared: Arc<TreeShared>,
        name: String,
        parent_id: Option<Uuid>,
        depth: usize,
    ) -> Self {
        shared.stats.record_scope_created();

        Self {
            inner: Arc::new(ScopeInner {
                id: Uuid::new_v4(),
                name,
                parent_id,
                depth,
                created_at: Instant::now(),
                shared,
                cache: Mutex::new(ScopeCache {
                    status: ScopeState::Active,
                    disposed_at: None,
                    instances: HashMap::new(),
                    teardowns: Vec::new(),
                    children: Vec::new(),
                }),
                resolving: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent_id(&self) -> Option<Uuid> {
        self.inner.parent_id
    }

    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    pub fn state(&self) -> ScopeState {
        self.inner.cache.lock().status
    }

    /// 是否已开始（或完成）销毁
    pub fn is_disposed(&self) -> bool {
        self.state() != ScopeState::Active
    }

    /// 整棵作用域树共享的注册表
    pub fn registry(&self) -> &Registry {
        &self.inner.shared.registry
    }

    /// 整棵作用域树的统计信息
    pub fn stats(&self) -> ContainerStats {
        let shared = &self.inner.shared;
        shared.stats.snapshot(shared.registry.len())
    }

    /// 解析服务
    ///
    /// 瞬态服务每次调用工厂；作用域服务在本作用域内至多创建一次，
    /// 之后返回同一个 `Arc`。工厂收到的解析器就是 `self`。
    pub fn resolve<T>(&self) -> Result<Arc<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<T>();
        let instance = self.resolve_erased(key)?;

        instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| ContainerError::TypeCastFailed {
                expected: key.type_name(),
                context: format!("resolution in scope '{}'", self.inner.name),
            })
    }

    fn resolve_erased(&self, key: ServiceKey) -> Result<ErasedInstance, ContainerError> {
        self.ensure_active("resolve")?;

        let shared = &self.inner.shared;
        let registration = shared.registry.lookup(&key)?;
        shared.stats.record_resolution();

        let _guard = ResolutionGuard::enter(&self.inner, key)?;
        tracing::trace!(
            scope = %self.inner.name,
            service = %key,
            lifetime = ?registration.lifetime(),
            "resolving service"
        );

        match registration.lifetime() {
            ServiceLifetime::Transient => {
                let instance = registration.create(self)?;
                shared.stats.record_transient_creation();
                Ok(instance)
            }
            ServiceLifetime::Scoped => self.resolve_scoped(registration),
        }
    }

    fn resolve_scoped(&self, registration: &Registration) -> Result<ErasedInstance, ContainerError> {
        let stats = &self.inner.shared.stats;
        let cell = {
            let mut cache = self.inner.cache.lock();
            if cache.status != ScopeState::Active {
                return Err(self.disposed_error("resolve"));
            }
            Arc::clone(cache.instances.entry(registration.key()).or_default())
        };

        if let Some(instance) = cell.get() {
            stats.record_cache_hit();
            return Ok(Arc::clone(instance));
        }

        // 失败时 OnceCell 保持为空：缓存与销毁列表都不受影响
        let instance = cell.get_or_try_init(|| {
            stats.record_cache_miss();
            let instance = registration.create(self)?;
            self.commit_scoped(registration, &instance)?;
            Ok::<_, ContainerError>(instance)
        })?;

        Ok(Arc::clone(instance))
    }

    /// 把新建的作用域实例登记到销毁列表
    fn commit_scoped(
        &self,
        registration: &Registration,
        instance: &ErasedInstance,
    ) -> Result<(), ContainerError> {
        let teardown = registration.teardown_for(instance);
        let mut cache = self.inner.cache.lock();

        if cache.status != ScopeState::Active {
            drop(cache);
            // 销毁已经开始：这个实例不会交给任何调用者，立即拆除
            if let Some(teardown) = teardown {
                let key = teardown.key;
                let result = teardown.run();
                self.inner.shared.stats.record_teardown(result.is_ok());
                if let Err(error) = result {
                    tracing::warn!(scope = %self.inner.name, service = %key, %error, "teardown failed");
                }
            }
            return Err(self.disposed_error("resolve"));
        }

        if let Some(teardown) = teardown {
            cache.teardowns.push(teardown);
        }
        drop(cache);

        self.inner.shared.stats.record_scoped_creation();
        tracing::debug!(
            scope = %self.inner.name,
            service = %registration.key(),
            disposable = registration.is_disposable(),
            "scoped instance created"
        );
        Ok(())
    }

    /// 创建子作用域，名称自动生成
    pub fn create_scope(&self) -> Result<Scope, ContainerError> {
        let seq = self.inner.shared.next_scope_seq();
        self.create_named_scope(format!("scope-{}", seq))
    }

    /// 创建命名子作用域。子作用域共享注册表，但缓存与销毁列表都是空的。
    pub fn create_named_scope(&self, name: impl Into<String>) -> Result<Scope, ContainerError> {
        let child = {
            let mut cache = self.inner.cache.lock();
            if cache.status != ScopeState::Active {
                return Err(self.disposed_error("create a child scope"));
            }

            // 持锁构建：子作用域要么登记到父作用域，要么根本不创建
            let child = Scope::from_parts(
                Arc::clone(&self.inner.shared),
                name.into(),
                Some(self.inner.id),
                self.inner.depth + 1,
            );
            cache.children.retain(|weak| weak.strong_count() > 0);
            cache.children.push(Arc::downgrade(&child.inner));
            child
        };

        tracing::debug!(
            parent = %self.inner.name,
            scope = %child.inner.name,
            depth = child.inner.depth,
            "scope created"
        );
        Ok(child)
    }

    /// 在新的子作用域中执行闭包，结束后销毁该作用域
    ///
    /// 销毁失败时返回 `DisposalFailed`，闭包的返回值随之丢弃；
    /// 需要保留返回值时请自行 `create_scope` 并调用 `dispose`。
    pub fn with_scope<R>(&self, f: impl FnOnce(&Scope) -> R) -> Result<R, ContainerError> {
        let scope = self.create_scope()?;
        let output = f(&scope);
        scope.dispose()?;
        Ok(output)
    }

    /// 销毁作用域
    ///
    /// 按创建顺序调用每个销毁回调，各一次。单个回调失败不会中断其余回调，
    /// 所有失败汇总到 `DisposalFailed`，作用域无论如何都会标记为已销毁。
    /// 重复调用是空操作。
    pub fn dispose(&self) -> Result<(), ContainerError> {
        let mut failures = Vec::new();
        if !self.dispose_into(&mut failures) || failures.is_empty() {
            return Ok(());
        }

        Err(ContainerError::DisposalFailed {
            scope: self.inner.name.clone(),
            failures,
        })
    }

    /// 返回 false 表示作用域已经在销毁或已销毁
    fn dispose_into(&self, failures: &mut Vec<DisposalFailure>) -> bool {
        let (teardowns, children) = {
            let mut cache = self.inner.cache.lock();
            if cache.status != ScopeState::Active {
                return false;
            }
            cache.status = ScopeState::Disposing;
            (
                std::mem::take(&mut cache.teardowns),
                std::mem::take(&mut cache.children),
            )
        };

        let shared = &self.inner.shared;
        if shared.config.cascade_dispose {
            for child in children.iter().filter_map(Weak::upgrade) {
                Scope { inner: child }.dispose_into(failures);
            }
        }

        let total = teardowns.len();
        for teardown in teardowns {
            let key = teardown.key;
            let result = teardown.run();
            shared.stats.record_teardown(result.is_ok());
            if let Err(error) = result {
                tracing::warn!(scope = %self.inner.name, service = %key, %error, "teardown failed");
                failures.push(DisposalFailure {
                    scope: self.inner.name.clone(),
                    service: key.type_name(),
                    error,
                });
            }
        }

        let instances = {
            let mut cache = self.inner.cache.lock();
            cache.status = ScopeState::Disposed;
            cache.disposed_at = Some(Instant::now());
            std::mem::take(&mut cache.instances)
        };
        // 在锁外释放实例
        drop(instances);

        shared.stats.record_scope_disposed();
        tracing::debug!(scope = %self.inner.name, teardowns = total, "scope disposed");
        true
    }

    /// 获取作用域信息快照
    pub fn info(&self) -> ScopeInfo {
        let cache = self.inner.cache.lock();
        let children: Vec<Arc<ScopeInner>> =
            cache.children.iter().filter_map(Weak::upgrade).collect();

        let mut info = ScopeInfo {
            id: self.inner.id,
            name: self.inner.name.clone(),
            parent_id: self.inner.parent_id,
            depth: self.inner.depth,
            state: cache.status,
            created_at: self.inner.created_at,
            disposed_at: cache.disposed_at,
            child_count: 0,
            scoped_instances: cache.instances.values().filter(|cell| cell.get().is_some()).count(),
            pending_disposals: cache.teardowns.len(),
        };
        drop(cache);

        // 只按 父 -> 子 的顺序加锁
        info.child_count = children
            .iter()
            .filter(|child| child.cache.lock().status == ScopeState::Active)
            .count();
        info
    }

    fn ensure_active(&self, operation: &'static str) -> Result<(), ContainerError> {
        if self.inner.cache.lock().status == ScopeState::Active {
            Ok(())
        } else {
            Err(self.disposed_error(operation))
        }
    }

    fn disposed_error(&self, operation: &'static str) -> ContainerError {
        ContainerError::ScopeDisposed {
            scope: self.inner.name.clone(),
            operation,
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("depth", &self.inner.depth)
            .finish()
    }
}

/// 解析栈上的一项，离开作用域时出栈
struct ResolutionGuard<'a> {
    inner: &'a ScopeInner,
    thread: ThreadId,
    key: ServiceKey,
}

impl<'a> ResolutionGuard<'a> {
    fn enter(inner: &'a ScopeInner, key: ServiceKey) -> Result<Self, ContainerError> {
        let thread = thread::current().id();
        let mut resolving = inner.resolving.lock();

        if resolving.iter().any(|(t, k)| *t == thread && *k == key) {
            let mut chain: Vec<&'static str> = resolving
                .iter()
                .filter(|(t, _)| *t == thread)
                .map(|(_, k)| k.short_name())
                .collect();
            chain.push(key.short_name());
            return Err(ContainerError::CircularDependency { chain });
        }

        resolving.push((thread, key));
        Ok(Self { inner, thread, key })
    }
}

impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        let mut resolving = self.inner.resolving.lock();
        if let Some(pos) = resolving
            .iter()
            .rposition(|(t, k)| *t == self.thread && *k == self.key)
        {
            resolving.remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::container::{BoxError, Dispose};
    use std::sync::atomic::AtomicUsize;

    struct Counter {
        id: usize,
    }

    fn tree(registry: Registry) -> Scope {
        Scope::new_root(TreeShared::new(registry, ContainerConfig::default()))
    }

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Dispose for Recorder {
        fn dispose(&self) -> Result<(), BoxError> {
            self.log.lock().push(self.label);
            Ok(())
        }
    }

    #[test]
    fn test_transient_creates_each_time() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let mut registry = Registry::new();
        registry
            .register_transient(move |_| {
                let id = counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Counter { id }))
            })
            .unwrap();

        let root = tree(registry);
        let first = root.resolve::<Counter>().unwrap();
        let second = root.resolve::<Counter>().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_ne!(first.id, second.id);
        assert_eq!(created.load(Ordering::SeqCst), 2);
        assert_eq!(root.info().scoped_instances, 0);
    }

    #[test]
    fn test_scoped_created_once_per_scope() {
        let mut registry = Registry::new();
        registry.register_scoped(|_| Ok(Arc::new(Counter { id: 7 }))).unwrap();

        let root = tree(registry);
        let first = root.resolve::<Counter>().unwrap();
        let second = root.resolve::<Counter>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let stats = root.stats();
        assert_eq!(stats.scoped_creations, 1);
        assert_eq!(stats.scoped_cache_misses, 1);
        assert_eq!(stats.scoped_cache_hits, 1);
    }

    #[test]
    fn test_teardowns_follow_creation_order_not_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = Registry::new();

        let first_log = log.clone();
        registry
            .register_scoped_disposable(move |_| {
                Ok(Arc::new(Recorder { label: "registered-first", log: first_log.clone() }))
            })
            .unwrap();

        struct Second(Recorder);
        impl Dispose for Second {
            fn dispose(&self) -> Result<(), BoxError> {
                self.0.dispose()
            }
        }
        let second_log = log.clone();
        registry
            .register_scoped_disposable(move |_| {
                Ok(Arc::new(Second(Recorder { label: "registered-second", log: second_log.clone() })))
            })
            .unwrap();

        let root = tree(registry);
        root.resolve::<Second>().unwrap();
        root.resolve::<Recorder>().unwrap();
        assert_eq!(root.info().pending_disposals, 2);

        root.dispose().unwrap();
        assert_eq!(*log.lock(), vec!["registered-second", "registered-first"]);
    }

    #[test]
    fn test_self_recursive_factory_is_detected() {
        let mut registry = Registry::new();
        registry
            .register_scoped(|scope: &Scope| {
                let inner = scope.resolve::<Counter>()?;
                Ok(Arc::new(Counter { id: inner.id + 1 }))
            })
            .unwrap();

        let root = tree(registry);
        match root.resolve::<Counter>() {
            Err(ContainerError::CircularDependency { chain }) => {
                assert_eq!(chain, vec!["Counter", "Counter"]);
            }
            other => panic!("Expected CircularDependency, got {:?}", other.map(|c| c.id)),
        }

        // 解析栈已清空，缓存中没有半成品
        assert!(root.inner.resolving.lock().is_empty());
        assert_eq!(root.info().scoped_instances, 0);
    }

    #[test]
    fn test_info_tracks_children() {
        let root = tree(Registry::new());
        let child = root.create_named_scope("child").unwrap();
        let grandchild = child.create_scope().unwrap();

        let info = root.info();
        assert_eq!(info.depth, 0);
        assert_eq!(info.child_count, 1);
        assert!(info.is_active());

        assert_eq!(child.parent_id(), Some(root.id()));
        assert_eq!(grandchild.parent_id(), Some(child.id()));
        assert_eq!(grandchild.depth(), 2);

        child.dispose().unwrap();
        assert_eq!(root.info().child_count, 0);
        assert!(grandchild.is_disposed());
        assert!(child.info().disposed_at.is_some());
    }

    #[test]
    fn test_dropping_undisposed_scope_runs_teardowns() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let recorder_log = log.clone();
        let mut registry = Registry::new();
        registry
            .register_scoped_disposable(move |_| {
                Ok(Arc::new(Recorder { label: "dropped", log: recorder_log.clone() }))
            })
            .unwrap();

        let root = tree(registry);
        {
            let child = root.create_scope().unwrap();
            child.resolve::<Recorder>().unwrap();
        }

        assert_eq!(*log.lock(), vec!["dropped"]);
    }
}
