//! Dependency resolution container
//!
//! The `Container` owns the descriptor stack and the singleton instance
//! cache, and implements resolution:
//!
//! 1. Look up the first descriptor registered under the requested identity.
//! 2. Transient: invoke the factory and return the fresh instance.
//! 3. Singleton: return the cached instance, or construct it exactly once,
//!    cache it and return it.
//!
//! Factory failures surface as [`DiError::ConstructionFailed`] and never
//! populate the cache.

use crate::storage::{DescriptorStack, InstanceCache};
use crate::{BoxError, ComponentDescriptor, ComponentKey, DiError, Instance, Result, Scope, Tag};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

/// Dependency resolution container.
///
/// Cloning a `Container` is cheap and yields a handle to the same
/// registrations and the same singleton instances.
///
/// # Re-entrancy
///
/// A factory may resolve other components from the container that is
/// constructing it. A singleton factory must not resolve its *own* identity:
/// that blocks forever waiting on itself.
///
/// # Examples
///
/// ```rust
/// use inject_container::Container;
/// use std::sync::Arc;
///
/// struct Logger { level: &'static str }
///
/// let container = Container::new();
/// container.singleton(|| Logger { level: "info" });
///
/// let a = container.resolve::<Logger>().unwrap();
/// let b = container.resolve::<Logger>().unwrap();
/// assert_eq!(a.level, "info");
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Clone)]
pub struct Container {
    /// Registrations, in order
    descriptors: Arc<DescriptorStack>,
    /// Constructed singletons
    instances: Arc<InstanceCache>,
    /// Set by the first resolution
    resolving: Arc<AtomicBool>,
}

impl Container {
    /// Create an empty container.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a container sized for roughly `capacity` registrations.
    pub fn with_capacity(capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "inject_container",
            capacity,
            "Creating new container"
        );

        Self {
            descriptors: Arc::new(DescriptorStack::with_capacity(capacity)),
            instances: Arc::new(InstanceCache::with_capacity(capacity)),
            resolving: Arc::new(AtomicBool::new(false)),
        }
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Append a descriptor to the stack.
    ///
    /// If the identity is already registered the new descriptor is shadowed:
    /// resolution keeps returning the first registration.
    ///
    /// # Panics
    ///
    /// Panics if the container is locked. Use
    /// [`try_register_descriptor`](Self::try_register_descriptor) to get an
    /// error instead.
    #[inline]
    pub fn register_descriptor(&self, descriptor: ComponentDescriptor) {
        if self.push(descriptor).is_err() {
            panic!("Cannot register components: container is locked");
        }
    }

    /// Append a descriptor, failing with [`DiError::Locked`] if the container
    /// is locked.
    #[inline]
    pub fn try_register_descriptor(&self, descriptor: ComponentDescriptor) -> Result<()> {
        self.push(descriptor)
    }

    /// Register a singleton: the factory runs on first resolution and the
    /// instance is shared afterwards.
    #[inline]
    pub fn singleton<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register_descriptor(ComponentDescriptor::new(None, Scope::Singleton, factory));
    }

    /// Register a transient: the factory runs on every resolution.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use inject_container::Container;
    /// use std::sync::atomic::{AtomicU64, Ordering};
    ///
    /// static COUNTER: AtomicU64 = AtomicU64::new(0);
    ///
    /// struct RequestId(u64);
    ///
    /// let container = Container::new();
    /// container.transient(|| RequestId(COUNTER.fetch_add(1, Ordering::SeqCst)));
    ///
    /// let id1 = container.resolve::<RequestId>().unwrap();
    /// let id2 = container.resolve::<RequestId>().unwrap();
    /// assert_ne!(id1.0, id2.0);
    /// ```
    #[inline]
    pub fn transient<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register_descriptor(ComponentDescriptor::new(None, Scope::Transient, factory));
    }

    /// Register a tagged singleton.
    #[inline]
    pub fn singleton_tagged<T, F>(&self, tag: impl Into<Tag>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register_descriptor(ComponentDescriptor::new(
            Some(tag.into()),
            Scope::Singleton,
            factory,
        ));
    }

    /// Register a tagged transient.
    #[inline]
    pub fn transient_tagged<T, F>(&self, tag: impl Into<Tag>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register_descriptor(ComponentDescriptor::new(
            Some(tag.into()),
            Scope::Transient,
            factory,
        ));
    }

    /// Register a factory that may fail.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use inject_container::{Container, DiError, Scope};
    ///
    /// #[derive(Debug)]
    /// struct Connection;
    ///
    /// let container = Container::new();
    /// container.register(None, Scope::Singleton, || Err::<Connection, _>("refused"));
    ///
    /// let err = container.resolve::<Connection>().unwrap_err();
    /// assert!(matches!(err, DiError::ConstructionFailed { .. }));
    /// ```
    #[inline]
    pub fn register<T, E, F>(&self, tag: Option<Tag>, scope: Scope, factory: F)
    where
        T: Send + Sync + 'static,
        E: Into<BoxError>,
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        self.register_descriptor(ComponentDescriptor::fallible(tag, scope, factory));
    }

    fn push(&self, descriptor: ComponentDescriptor) -> Result<()> {
        #[cfg(feature = "logging")]
        let (key, scope) = (descriptor.key().clone(), descriptor.scope());

        let reachable = match self.descriptors.push(descriptor) {
            Ok(reachable) => reachable,
            Err(err) => {
                #[cfg(feature = "logging")]
                warn!(
                    target: "inject_container",
                    component = %key,
                    "Rejected registration on locked container"
                );
                return Err(err);
            }
        };

        #[cfg(feature = "logging")]
        if self.resolving.load(Ordering::Relaxed) {
            warn!(
                target: "inject_container",
                component = %key,
                "Registered component after resolution has started"
            );
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "inject_container",
            component = %key,
            scope = scope.as_str(),
            descriptor_count = self.descriptors.len(),
            shadowed = !reachable,
            "Registered component"
        );

        #[cfg(not(feature = "logging"))]
        let _ = reachable;

        Ok(())
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve the untagged component of type `T`.
    #[inline]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.resolve_key(&ComponentKey::of::<T>())
    }

    /// Resolve the component of type `T` registered under `tag`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use inject_container::Container;
    ///
    /// struct Storage { path: &'static str }
    ///
    /// let container = Container::new();
    /// container.singleton_tagged("memory", || Storage { path: ":memory:" });
    /// container.singleton_tagged("disk", || Storage { path: "/var/lib/app" });
    ///
    /// assert_eq!(container.resolve_tagged::<Storage>("disk").unwrap().path, "/var/lib/app");
    /// assert!(container.resolve::<Storage>().is_err());
    /// ```
    #[inline]
    pub fn resolve_tagged<T: Send + Sync + 'static>(&self, tag: impl Into<Tag>) -> Result<Arc<T>> {
        self.resolve_key(&ComponentKey::tagged::<T>(tag))
    }

    /// Resolve by explicit identity and downcast to `T`.
    pub fn resolve_key<T: Send + Sync + 'static>(&self, key: &ComponentKey) -> Result<Arc<T>> {
        self.resolve_instance(key)?.downcast::<T>().map_err(|_| {
            #[cfg(feature = "logging")]
            warn!(
                target: "inject_container",
                component = %key,
                expected = std::any::type_name::<T>(),
                "Component factory produced an unexpected type"
            );
            DiError::type_mismatch::<T>(key.clone())
        })
    }

    /// Resolve the untagged `T`, treating a missing registration as `None`.
    ///
    /// Construction failures of a registered component are still errors.
    #[inline]
    pub fn resolve_optional<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>> {
        self.resolve_optional_key(&ComponentKey::of::<T>())
    }

    /// Tagged variant of [`resolve_optional`](Self::resolve_optional).
    #[inline]
    pub fn resolve_optional_tagged<T: Send + Sync + 'static>(
        &self,
        tag: impl Into<Tag>,
    ) -> Result<Option<Arc<T>>> {
        self.resolve_optional_key(&ComponentKey::tagged::<T>(tag))
    }

    /// Resolve by identity, treating a missing registration as `None`.
    pub fn resolve_optional_key<T: Send + Sync + 'static>(
        &self,
        key: &ComponentKey,
    ) -> Result<Option<Arc<T>>> {
        match self.resolve_key(key) {
            Ok(instance) => Ok(Some(instance)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Resolve the untagged `T`, discarding any error.
    #[inline]
    pub fn try_resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.resolve().ok()
    }

    /// Resolve an identity to its type-erased instance.
    pub fn resolve_instance(&self, key: &ComponentKey) -> Result<Instance> {
        if !self.resolving.load(Ordering::Relaxed) {
            self.resolving.store(true, Ordering::Relaxed);
        }

        let Some(descriptor) = self.descriptors.find(key) else {
            #[cfg(feature = "logging")]
            debug!(
                target: "inject_container",
                component = %key,
                "Component not found"
            );
            return Err(DiError::not_found(key.clone()));
        };

        match descriptor.scope() {
            Scope::Transient => descriptor
                .construct()
                .map_err(|cause| self.construction_failed(key, cause)),
            Scope::Singleton => {
                let (instance, constructed) = self
                    .instances
                    .get_or_construct(key, || descriptor.construct())
                    .map_err(|cause| self.construction_failed(key, cause))?;

                #[cfg(feature = "logging")]
                if constructed {
                    debug!(
                        target: "inject_container",
                        component = %key,
                        cached_count = self.instances.len(),
                        "Constructed singleton"
                    );
                } else {
                    trace!(
                        target: "inject_container",
                        component = %key,
                        "Singleton resolved from cache"
                    );
                }

                #[cfg(not(feature = "logging"))]
                let _ = constructed;

                Ok(instance)
            }
        }
    }

    fn construction_failed(&self, key: &ComponentKey, cause: BoxError) -> DiError {
        #[cfg(feature = "logging")]
        warn!(
            target: "inject_container",
            component = %key,
            error = %cause,
            "Component construction failed"
        );

        DiError::construction_failed(key.clone(), cause)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Whether an untagged `T` is registered.
    #[inline]
    pub fn contains<T: 'static>(&self) -> bool {
        self.contains_key(&ComponentKey::of::<T>())
    }

    #[inline]
    pub fn contains_key(&self, key: &ComponentKey) -> bool {
        self.descriptors.contains(key)
    }

    /// Number of registered descriptors, shadowed ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Reachable identities in registration order.
    #[inline]
    pub fn registered_keys(&self) -> Vec<ComponentKey> {
        self.descriptors.keys()
    }

    /// Number of singletons constructed so far.
    #[inline]
    pub fn cached_count(&self) -> usize {
        self.instances.len()
    }

    // =========================================================================
    // Lifecycle Methods
    // =========================================================================

    /// Lock the container to prevent further registrations.
    ///
    /// Call this once wiring is complete so that late registrations fail
    /// loudly instead of being silently shadowed. A registration racing
    /// with `lock()` either lands before it or is rejected.
    #[inline]
    pub fn lock(&self) {
        self.descriptors.lock();

        #[cfg(feature = "logging")]
        debug!(
            target: "inject_container",
            descriptor_count = self.descriptors.len(),
            "Container locked - no further registrations allowed"
        );
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.descriptors.is_locked()
    }

    /// Panic if locked (internal helper).
    #[inline]
    fn check_not_locked(&self) {
        if self.is_locked() {
            panic!("Cannot register components: container is locked");
        }
    }

    // =========================================================================
    // Batch Registration
    // =========================================================================

    /// Register several components under a single lock check.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use inject_container::Container;
    ///
    /// struct Database { url: String }
    /// struct Cache { size: usize }
    ///
    /// let container = Container::new();
    /// container.batch(|batch| {
    ///     batch.singleton(|| Database { url: "postgres://localhost".into() });
    ///     batch.transient(|| Cache { size: 1024 });
    /// });
    ///
    /// assert!(container.contains::<Database>());
    /// assert!(container.contains::<Cache>());
    /// ```
    pub fn batch<F>(&self, f: F)
    where
        F: FnOnce(BatchRegistrar<'_>),
    {
        self.check_not_locked();

        #[cfg(feature = "logging")]
        let start_count = self.descriptors.len();

        f(BatchRegistrar { container: self });

        #[cfg(feature = "logging")]
        debug!(
            target: "inject_container",
            registered = self.descriptors.len() - start_count,
            "Batch registration completed"
        );
    }
}

/// Registration handle passed to [`Container::batch`].
pub struct BatchRegistrar<'a> {
    container: &'a Container,
}

impl BatchRegistrar<'_> {
    #[inline]
    pub fn singleton<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.descriptor(ComponentDescriptor::new(None, Scope::Singleton, factory));
    }

    #[inline]
    pub fn transient<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.descriptor(ComponentDescriptor::new(None, Scope::Transient, factory));
    }

    #[inline]
    pub fn singleton_tagged<T, F>(&self, tag: impl Into<Tag>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.descriptor(ComponentDescriptor::new(
            Some(tag.into()),
            Scope::Singleton,
            factory,
        ));
    }

    #[inline]
    pub fn transient_tagged<T, F>(&self, tag: impl Into<Tag>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.descriptor(ComponentDescriptor::new(
            Some(tag.into()),
            Scope::Transient,
            factory,
        ));
    }

    /// # Panics
    ///
    /// Panics if the container was locked after the batch started.
    #[inline]
    pub fn descriptor(&self, descriptor: ComponentDescriptor) {
        self.container.register_descriptor(descriptor);
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("descriptor_count", &self.len())
            .field("cached_count", &self.cached_count())
            .field("locked", &self.is_locked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::AtomicU32;
    use std::thread;

    #[derive(Debug)]
    struct TestService {
        value: String,
    }

    #[allow(dead_code)]
    struct AnotherService {
        name: String,
    }

    /// Wrap `make` so every call bumps `counter` and receives its old value.
    fn counting<T, M>(counter: Arc<AtomicU32>, make: M) -> impl Fn() -> T + Send + Sync + 'static
    where
        T: Send + Sync + 'static,
        M: Fn(u32) -> T + Send + Sync + 'static,
    {
        move || make(counter.fetch_add(1, Ordering::SeqCst))
    }

    #[test]
    fn test_singleton() {
        let calls = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        container.singleton(counting(Arc::clone(&calls), |n| TestService {
            value: format!("instance-{n}"),
        }));

        // Not constructed until first resolution
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let s1 = container.resolve::<TestService>().unwrap();
        let s2 = container.resolve::<TestService>().unwrap();

        assert_eq!(s1.value, "instance-0");
        assert!(Arc::ptr_eq(&s1, &s2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(container.cached_count(), 1);
    }

    #[test]
    fn test_transient() {
        let calls = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        container.transient(counting(Arc::clone(&calls), |n| TestService {
            value: format!("instance-{n}"),
        }));

        let t1 = container.resolve::<TestService>().unwrap();
        let t2 = container.resolve::<TestService>().unwrap();

        assert_eq!(t1.value, "instance-0");
        assert_eq!(t2.value, "instance-1");
        assert!(!Arc::ptr_eq(&t1, &t2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(container.cached_count(), 0);
    }

    #[test]
    fn test_not_found_invokes_no_factory() {
        let calls = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        container.singleton(counting(Arc::clone(&calls), |_| AnotherService {
            name: "other".into(),
        }));

        let err = container.resolve::<TestService>().unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.key(), Some(&ComponentKey::of::<TestService>()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(container.try_resolve::<TestService>().is_none());
    }

    #[test]
    fn test_first_registration_shadows_later() {
        let container = Container::new();
        container.singleton(|| TestService {
            value: "first".into(),
        });
        container.singleton(|| TestService {
            value: "second".into(),
        });

        assert_eq!(container.len(), 2);
        assert_eq!(container.registered_keys().len(), 1);
        for _ in 0..3 {
            assert_eq!(container.resolve::<TestService>().unwrap().value, "first");
        }
    }

    #[test]
    fn test_untagged_does_not_match_tagged() {
        let container = Container::new();
        container.singleton_tagged("primary", || TestService {
            value: "tagged".into(),
        });

        assert!(container.resolve::<TestService>().unwrap_err().is_not_found());
        assert_eq!(
            container.resolve_tagged::<TestService>("primary").unwrap().value,
            "tagged"
        );
        assert!(!container.contains::<TestService>());
        assert!(container.contains_key(&ComponentKey::tagged::<TestService>("primary")));
    }

    #[test]
    fn test_concurrent_singleton_constructed_once() {
        const THREADS: usize = 16;

        let calls = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        container.singleton(counting(Arc::clone(&calls), |n| {
            // Widen the race window
            thread::sleep(std::time::Duration::from_millis(5));
            TestService {
                value: format!("instance-{n}"),
            }
        }));

        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let container = container.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    container.resolve::<TestService>().unwrap()
                })
            })
            .collect();

        let resolved: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(resolved.iter().all(|s| Arc::ptr_eq(s, &resolved[0])));
    }

    #[test]
    fn test_construction_failure_not_cached() {
        let attempts = Arc::new(AtomicU32::new(0));
        let a = Arc::clone(&attempts);

        let container = Container::new();
        container.register(None, Scope::Singleton, move || {
            if a.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("first attempt fails")
            } else {
                Ok(TestService {
                    value: "recovered".into(),
                })
            }
        });

        let err = container.resolve::<TestService>().unwrap_err();
        assert!(matches!(err, DiError::ConstructionFailed { .. }));
        assert!(err.to_string().ends_with("first attempt fails"));
        assert_eq!(container.cached_count(), 0);

        let s1 = container.resolve::<TestService>().unwrap();
        let s2 = container.resolve::<TestService>().unwrap();
        assert_eq!(s1.value, "recovered");
        assert!(Arc::ptr_eq(&s1, &s2));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let container = Container::new();
        container.register_descriptor(ComponentDescriptor::erased(
            ComponentKey::of::<TestService>(),
            Scope::Transient,
            || Ok(Arc::new(42u32) as Instance),
        ));

        let err = container.resolve::<TestService>().unwrap_err();
        assert!(matches!(err, DiError::TypeMismatch { .. }));
    }

    #[test]
    fn test_factory_may_resolve_other_components() {
        let container = Container::new();
        container.singleton(|| AnotherService {
            name: "dep".into(),
        });

        let inner = container.clone();
        container.register(None, Scope::Singleton, move || {
            let dep = inner.resolve::<AnotherService>()?;
            Ok::<_, DiError>(TestService {
                value: format!("uses-{}", dep.name),
            })
        });

        assert_eq!(container.resolve::<TestService>().unwrap().value, "uses-dep");
    }

    #[test]
    fn test_missing_dependency_inside_factory_is_construction_failure() {
        let container = Container::new();
        let inner = container.clone();
        container.register(None, Scope::Singleton, move || {
            inner.resolve::<AnotherService>().map(|dep| TestService {
                value: dep.name.clone(),
            })
        });

        let err = container.resolve_optional::<TestService>().unwrap_err();
        assert!(matches!(err, DiError::ConstructionFailed { .. }));
    }

    #[test]
    fn test_resolve_optional() {
        let container = Container::new();
        container.singleton_tagged("present", || TestService {
            value: "here".into(),
        });

        assert!(container.resolve_optional::<TestService>().unwrap().is_none());
        assert_eq!(
            container
                .resolve_optional_tagged::<TestService>("present")
                .unwrap()
                .unwrap()
                .value,
            "here"
        );
    }

    #[test]
    fn test_lock() {
        let container = Container::new();
        assert!(!container.is_locked());

        container.lock();
        assert!(container.is_locked());

        let result = container.try_register_descriptor(ComponentDescriptor::new(
            None,
            Scope::Singleton,
            || TestService {
                value: "late".into(),
            },
        ));
        assert!(matches!(result, Err(DiError::Locked)));
        assert!(container.is_empty());
    }

    #[test]
    #[should_panic(expected = "Cannot register components: container is locked")]
    fn test_register_after_lock() {
        let container = Container::new();
        container.lock();
        container.singleton(|| TestService {
            value: "fail".into(),
        });
    }

    #[test]
    fn test_registration_racing_lock_is_accepted_or_rejected() {
        const THREADS: usize = 8;

        let container = Container::new();
        let barrier = Arc::new(Barrier::new(THREADS + 1));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let container = container.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let mut accepted = 0;
                    for i in 0..200 {
                        let descriptor = ComponentDescriptor::new(
                            Some(Tag::from(t * 1000 + i)),
                            Scope::Singleton,
                            || 0u32,
                        );
                        if container.try_register_descriptor(descriptor).is_ok() {
                            accepted += 1;
                        }
                    }
                    accepted
                })
            })
            .collect();

        barrier.wait();
        container.lock();
        let len_at_lock = container.len();

        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        // Nothing lands once lock() has returned
        assert_eq!(container.len(), len_at_lock);
        assert_eq!(accepted, len_at_lock);
    }

    #[test]
    fn test_registration_after_resolution_is_accepted() {
        let container = Container::new();
        assert!(container.try_resolve::<TestService>().is_none());

        container.singleton(|| TestService {
            value: "late".into(),
        });
        assert_eq!(container.resolve::<TestService>().unwrap().value, "late");
    }

    #[test]
    fn test_clone_shares_state() {
        let container = Container::new();
        let handle = container.clone();
        handle.singleton(|| TestService {
            value: "shared".into(),
        });

        let a = container.resolve::<TestService>().unwrap();
        let b = handle.resolve::<TestService>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_batch_registration() {
        #[derive(Debug)]
        struct ServiceA(i32);

        let container = Container::new();
        container.batch(|batch| {
            batch.singleton(|| ServiceA(42));
            batch.transient_tagged("t", || TestService {
                value: "transient".into(),
            });
            batch.singleton_tagged("s", || TestService {
                value: "singleton".into(),
            });
        });

        assert_eq!(container.len(), 3);
        assert_eq!(container.resolve::<ServiceA>().unwrap().0, 42);
        assert_eq!(
            container.registered_keys(),
            vec![
                ComponentKey::of::<ServiceA>(),
                ComponentKey::tagged::<TestService>("t"),
                ComponentKey::tagged::<TestService>("s"),
            ]
        );
    }
}
