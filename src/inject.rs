//! Injection handles
//!
//! Three ways for a consumer to hold a dependency:
//!
//! - [`Inject`]: resolved when the handle is built. Building fails if the
//!   component cannot be resolved, so a live handle always holds a value.
//! - [`LazyInject`]: resolved on first access, exactly once.
//! - [`OptionalInject`]: like `LazyInject`, but a missing registration
//!   resolves to `None`.
//!
//! Every handle resolves against the container it was built from; there is
//! no ambient global container.
//!
//! # Failure policy
//!
//! A lazy handle whose first access fails stays unresolved. The error is
//! returned to that caller and the next access runs the resolver again.

use crate::{AtomicCell, ComponentKey, Container, Result, Tag};
use parking_lot::Mutex;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

// =============================================================================
// Deferred resolution state
// =============================================================================

type Resolver<V> = Arc<dyn Fn() -> Result<V> + Send + Sync>;

#[derive(Clone)]
enum State<V> {
    Unresolved(Resolver<V>),
    Resolved(V),
}

/// Once-only memoization of a resolver, shared by the lazy handles.
///
/// `state` is only ever locked for a read or a swap, never while the
/// resolver runs. First accesses are serialized on `init` instead, so
/// `is_resolved` and `Debug` stay non-blocking during construction.
struct Deferred<V> {
    key: ComponentKey,
    state: AtomicCell<State<V>>,
    init: Mutex<()>,
}

impl<V: Clone> Deferred<V> {
    fn new(key: ComponentKey, resolver: Resolver<V>) -> Self {
        Self {
            key,
            state: AtomicCell::new(State::Unresolved(resolver)),
            init: Mutex::new(()),
        }
    }

    fn resolved(&self) -> Option<V> {
        self.state.mutate(|state| match state {
            State::Resolved(value) => Some(value.clone()),
            State::Unresolved(_) => None,
        })
    }

    /// Resolve on first call, return the memoized value afterwards.
    ///
    /// Concurrent first callers queue on `init`; the winner runs the
    /// resolver and the rest find `Resolved` once they get the guard.
    fn get(&self) -> Result<V> {
        if let Some(value) = self.resolved() {
            #[cfg(feature = "logging")]
            trace!(
                target: "inject_container",
                component = %self.key,
                "Lazy handle already resolved"
            );
            return Ok(value);
        }

        let _init = self.init.lock();

        let resolver = match self.state.load() {
            State::Resolved(value) => return Ok(value),
            State::Unresolved(resolver) => resolver,
        };

        #[cfg(feature = "logging")]
        debug!(
            target: "inject_container",
            component = %self.key,
            "Lazy handle resolving on first access"
        );

        let value = resolver()?;
        // Drops the resolver and the container clone it captured
        self.state.swap(State::Resolved(value.clone()));
        Ok(value)
    }

    fn is_resolved(&self) -> bool {
        self.state
            .mutate(|state| matches!(state, State::Resolved(_)))
    }
}

// =============================================================================
// Eager
// =============================================================================

/// Dependency resolved when the handle is constructed.
///
/// # Examples
///
/// ```rust
/// use inject_container::{Container, Inject};
///
/// struct Config { debug: bool }
///
/// let container = Container::new();
/// container.singleton(|| Config { debug: true });
///
/// let config = Inject::<Config>::new(&container).unwrap();
/// assert!(config.debug);
///
/// // Nothing registered: the handle cannot exist
/// assert!(Inject::<String>::new(&container).is_err());
/// ```
pub struct Inject<T> {
    key: ComponentKey,
    value: Arc<T>,
}

impl<T: Send + Sync + 'static> Inject<T> {
    #[inline]
    pub fn new(container: &Container) -> Result<Self> {
        Self::from_key(container, ComponentKey::of::<T>())
    }

    #[inline]
    pub fn with_tag(container: &Container, tag: impl Into<Tag>) -> Result<Self> {
        Self::from_key(container, ComponentKey::tagged::<T>(tag))
    }

    pub fn from_key(container: &Container, key: ComponentKey) -> Result<Self> {
        let value = container.resolve_key::<T>(&key)?;
        Ok(Self { key, value })
    }
}

impl<T> Inject<T> {
    #[inline]
    pub fn get(&self) -> &Arc<T> {
        &self.value
    }

    #[inline]
    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    #[inline]
    pub fn into_inner(self) -> Arc<T> {
        self.value
    }
}

impl<T> Deref for Inject<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> Clone for Inject<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: Arc::clone(&self.value),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}

// =============================================================================
// Lazy
// =============================================================================

/// Dependency resolved on first access and memoized.
///
/// `is_resolved` and `Debug` never wait on a resolution in progress. A
/// factory that calls `get` on the handle it is resolving for deadlocks,
/// the same way a singleton factory resolving its own identity does.
///
/// # Examples
///
/// ```rust
/// use inject_container::{Container, LazyInject};
///
/// struct Mailer { host: &'static str }
///
/// let container = Container::new();
/// let mailer = LazyInject::<Mailer>::new(&container);
///
/// // Registration may happen after the handle is built
/// container.singleton(|| Mailer { host: "smtp.local" });
///
/// assert!(!mailer.is_resolved());
/// assert_eq!(mailer.get().unwrap().host, "smtp.local");
/// assert!(mailer.is_resolved());
/// ```
pub struct LazyInject<T> {
    inner: Deferred<Arc<T>>,
}

impl<T: Send + Sync + 'static> LazyInject<T> {
    #[inline]
    pub fn new(container: &Container) -> Self {
        Self::from_key(container, ComponentKey::of::<T>())
    }

    #[inline]
    pub fn with_tag(container: &Container, tag: impl Into<Tag>) -> Self {
        Self::from_key(container, ComponentKey::tagged::<T>(tag))
    }

    pub fn from_key(container: &Container, key: ComponentKey) -> Self {
        let container = container.clone();
        let target = key.clone();
        Self {
            inner: Deferred::new(key, Arc::new(move || container.resolve_key::<T>(&target))),
        }
    }
}

impl<T> LazyInject<T> {
    /// Resolve on first call; later calls return the same instance.
    #[inline]
    pub fn get(&self) -> Result<Arc<T>> {
        self.inner.get()
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.inner.is_resolved()
    }

    #[inline]
    pub fn key(&self) -> &ComponentKey {
        &self.inner.key
    }
}

impl<T> fmt::Debug for LazyInject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyInject")
            .field("key", self.key())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

// =============================================================================
// Optional
// =============================================================================

/// Lazily resolved dependency that tolerates a missing registration.
///
/// A missing registration resolves to `None` (and stays `None`). A
/// registered component whose factory fails is still an error.
///
/// Shares the first-access behavior of [`LazyInject`], including the
/// deadlock when a factory calls `get` on the handle being resolved.
pub struct OptionalInject<T> {
    inner: Deferred<Option<Arc<T>>>,
}

impl<T: Send + Sync + 'static> OptionalInject<T> {
    #[inline]
    pub fn new(container: &Container) -> Self {
        Self::from_key(container, ComponentKey::of::<T>())
    }

    #[inline]
    pub fn with_tag(container: &Container, tag: impl Into<Tag>) -> Self {
        Self::from_key(container, ComponentKey::tagged::<T>(tag))
    }

    pub fn from_key(container: &Container, key: ComponentKey) -> Self {
        let container = container.clone();
        let target = key.clone();
        Self {
            inner: Deferred::new(
                key,
                Arc::new(move || container.resolve_optional_key::<T>(&target)),
            ),
        }
    }
}

impl<T> OptionalInject<T> {
    #[inline]
    pub fn get(&self) -> Result<Option<Arc<T>>> {
        self.inner.get()
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.inner.is_resolved()
    }

    #[inline]
    pub fn key(&self) -> &ComponentKey {
        &self.inner.key
    }
}

impl<T> fmt::Debug for OptionalInject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionalInject")
            .field("key", self.key())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
