//! Component descriptors
//!
//! A descriptor binds a [`ComponentKey`] to a [`Scope`] and a type-erased
//! factory. Descriptors are immutable once built and are owned by the
//! container's descriptor stack.

use crate::{ComponentKey, Tag};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// Type-erased component instance, as stored in the instance cache.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Boxed error returned by fallible factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Type-erased factory function.
type ErasedFactory = Arc<dyn Fn() -> std::result::Result<Instance, BoxError> + Send + Sync>;

/// Lifecycle policy of a registered component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// Constructed on first resolution, then shared by every caller.
    #[default]
    Singleton,

    /// Constructed afresh on every resolution.
    Transient,
}

impl Scope {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Singleton => "singleton",
            Scope::Transient => "transient",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration record: identity, scope and factory.
#[derive(Clone)]
pub struct ComponentDescriptor {
    key: ComponentKey,
    scope: Scope,
    factory: ErasedFactory,
}

impl ComponentDescriptor {
    /// Build a descriptor from an infallible factory.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use inject_container::{ComponentDescriptor, Scope};
    ///
    /// struct Logger { level: &'static str }
    ///
    /// let descriptor = ComponentDescriptor::new(None, Scope::Singleton, || Logger { level: "info" });
    /// assert_eq!(descriptor.scope(), Scope::Singleton);
    /// assert!(descriptor.key().is::<Logger>());
    /// ```
    #[inline]
    pub fn new<T, F>(tag: Option<Tag>, scope: Scope, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::fallible(tag, scope, move || Ok::<T, BoxError>(factory()))
    }

    /// Build a descriptor from a factory that may fail.
    ///
    /// A factory error surfaces from resolution as
    /// [`DiError::ConstructionFailed`](crate::DiError::ConstructionFailed).
    pub fn fallible<T, E, F>(tag: Option<Tag>, scope: Scope, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        E: Into<BoxError>,
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        let mut key = ComponentKey::of::<T>();
        if let Some(tag) = tag {
            key = key.with_tag(tag);
        }

        let erased: ErasedFactory =
            Arc::new(move || -> std::result::Result<Instance, BoxError> {
                match factory() {
                    Ok(instance) => Ok(Arc::new(instance) as Instance),
                    Err(err) => Err(err.into()),
                }
            });

        Self {
            key,
            scope,
            factory: erased,
        }
    }

    /// Build a descriptor from an already type-erased factory.
    ///
    /// The factory is expected to produce the type named by `key`; a mismatch
    /// is detected when the instance is downcast at resolution time.
    pub fn erased<F>(key: ComponentKey, scope: Scope, factory: F) -> Self
    where
        F: Fn() -> std::result::Result<Instance, BoxError> + Send + Sync + 'static,
    {
        Self {
            key,
            scope,
            factory: Arc::new(factory),
        }
    }

    #[inline]
    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    #[inline]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Invoke the factory.
    #[inline]
    pub(crate) fn construct(&self) -> std::result::Result<Instance, BoxError> {
        #[cfg(feature = "logging")]
        trace!(
            target: "inject_container",
            component = %self.key,
            scope = self.scope.as_str(),
            "Invoking component factory"
        );

        (self.factory)()
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct TestService {
        id: u32,
    }

    #[test]
    fn test_descriptor_key_and_scope() {
        let plain = ComponentDescriptor::new(None, Scope::Transient, || TestService { id: 1 });
        let tagged = ComponentDescriptor::new(Some("primary".into()), Scope::Singleton, || {
            TestService { id: 2 }
        });

        assert_eq!(plain.key(), &ComponentKey::of::<TestService>());
        assert_eq!(plain.scope(), Scope::Transient);
        assert_eq!(tagged.key(), &ComponentKey::tagged::<TestService>("primary"));
        assert_eq!(tagged.scope(), Scope::Singleton);
    }

    #[test]
    fn test_construct_invokes_factory_each_time() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&counter);
        let descriptor = ComponentDescriptor::new(None, Scope::Singleton, move || TestService {
            id: c.fetch_add(1, Ordering::SeqCst),
        });

        let a = descriptor.construct().unwrap().downcast::<TestService>().unwrap();
        let b = descriptor.construct().unwrap().downcast::<TestService>().unwrap();

        // Caching is the container's job, not the descriptor's
        assert_eq!(a.id, 0);
        assert_eq!(b.id, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fallible_factory_error() {
        let descriptor = ComponentDescriptor::fallible(None, Scope::Singleton, || {
            Err::<TestService, _>("disk unavailable")
        });

        let err = descriptor.construct().unwrap_err();
        assert_eq!(err.to_string(), "disk unavailable");
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(Scope::default(), Scope::Singleton);
        assert_eq!(Scope::Singleton.to_string(), "singleton");
        assert_eq!(Scope::Transient.to_string(), "transient");
    }
}
