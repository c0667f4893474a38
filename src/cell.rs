//! A minimal thread-safe mutable cell.

use parking_lot::Mutex;
use std::fmt;

/// Thread-safe cell supporting an atomic read and an atomic
/// read-modify-write.
///
/// Every operation runs under the cell's own lock, so a closure passed to
/// [`mutate`](AtomicCell::mutate) observes and replaces the value as a single
/// step. The lock is private to the cell; nothing else is held while the
/// closure runs.
///
/// # Examples
///
/// ```rust
/// use inject_container::AtomicCell;
///
/// let cell = AtomicCell::new(1);
/// let previous = cell.mutate(|v| {
///     let old = *v;
///     *v += 1;
///     old
/// });
///
/// assert_eq!(previous, 1);
/// assert_eq!(cell.load(), 2);
/// ```
pub struct AtomicCell<T> {
    value: Mutex<T>,
}

impl<T> AtomicCell<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    /// Snapshot of the current value.
    #[inline]
    pub fn load(&self) -> T
    where
        T: Clone,
    {
        self.value.lock().clone()
    }

    /// Read and modify the value in one atomic step.
    #[inline]
    pub fn mutate<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.value.lock())
    }

    /// Replace the value, returning the previous one.
    #[inline]
    pub fn swap(&self, value: T) -> T {
        std::mem::replace(&mut *self.value.lock(), value)
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: Default> Default for AtomicCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for AtomicCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.try_lock() {
            Some(value) => f.debug_tuple("AtomicCell").field(&*value).finish(),
            None => f.write_str("AtomicCell(<locked>)"),
        }
    }
}
