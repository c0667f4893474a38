//! Storage for the container
//!
//! Two structures back a [`Container`](crate::Container):
//!
//! - [`DescriptorStack`]: every registration in order, plus an index from
//!   identity to the *first* descriptor registered under it.
//! - [`InstanceCache`]: one once-cell per singleton identity, so each
//!   singleton is constructed at most once.

use crate::{ComponentDescriptor, ComponentKey, DiError, Instance, Result};
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shard count for a map expected to hold `capacity` entries.
///
/// Default DashMap uses num_cpus * 4 shards which is overkill for
/// typical containers with <50 components.
fn shard_amount(capacity: usize) -> usize {
    if capacity <= 16 {
        8
    } else if capacity <= 64 {
        16
    } else {
        32
    }
}

/// Append-only stack of component descriptors.
///
/// Lookup returns the earliest registration for an identity. Later
/// registrations under the same identity are kept but shadowed.
pub(crate) struct DescriptorStack {
    /// All descriptors in registration order
    entries: RwLock<Vec<Arc<ComponentDescriptor>>>,
    /// Identity -> first descriptor registered under it
    index: DashMap<ComponentKey, Arc<ComponentDescriptor>, RandomState>,
    /// Only written under the `entries` write guard
    locked: AtomicBool,
}

impl DescriptorStack {
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::with_capacity(capacity)),
            index: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount(capacity),
            ),
            locked: AtomicBool::new(false),
        }
    }

    /// Append a descriptor.
    ///
    /// Returns `Ok(false)` if an earlier descriptor already owns the
    /// identity, in which case the new one is unreachable by lookup, and
    /// [`DiError::Locked`] if [`lock`](Self::lock) has been called.
    pub fn push(&self, descriptor: ComponentDescriptor) -> Result<bool> {
        // Held across the lock check and the index update, so a push either
        // lands before `lock()` or is rejected, and registration order and
        // first-wins agree under concurrent registration.
        let mut entries = self.entries.write();
        if self.locked.load(Ordering::Acquire) {
            return Err(DiError::Locked);
        }

        let descriptor = Arc::new(descriptor);
        let reachable = match self.index.entry(descriptor.key().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&descriptor));
                true
            }
        };
        entries.push(descriptor);
        Ok(reachable)
    }

    /// Reject every later push. Waits for pushes already in progress.
    pub fn lock(&self) {
        let _entries = self.entries.write();
        self.locked.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// First descriptor registered under `key`.
    #[inline]
    pub fn find(&self, key: &ComponentKey) -> Option<Arc<ComponentDescriptor>> {
        self.index.get(key).map(|d| Arc::clone(d.value()))
    }

    #[inline]
    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.index.contains_key(key)
    }

    /// Number of descriptors, shadowed ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Reachable identities, in registration order.
    pub fn keys(&self) -> Vec<ComponentKey> {
        self.entries
            .read()
            .iter()
            .filter(|d| self.find(d.key()).is_some_and(|first| Arc::ptr_eq(&first, d)))
            .map(|d| d.key().clone())
            .collect()
    }
}

impl Default for DescriptorStack {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DescriptorStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorStack")
            .field("count", &self.len())
            .field("reachable", &self.index.len())
            .finish()
    }
}

/// Growth-only cache of constructed singletons.
///
/// Each identity gets its own once-cell. The map guard is released before
/// the cell is initialized, so a factory may resolve *other* identities
/// from the same container while it runs.
pub(crate) struct InstanceCache {
    cells: DashMap<ComponentKey, Arc<OnceCell<Instance>>, RandomState>,
}

impl InstanceCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount(capacity),
            ),
        }
    }

    /// Cached instance for `key`, if one has been constructed.
    #[inline]
    pub fn get(&self, key: &ComponentKey) -> Option<Instance> {
        self.cells
            .get(key)
            .and_then(|cell| cell.value().get().map(Arc::clone))
    }

    /// Return the cached instance for `key`, or run `construct` and cache
    /// its result.
    ///
    /// Concurrent callers for the same identity block until the winner
    /// finishes; `construct` runs at most once per successful cache fill.
    /// A failed construction leaves the cell empty. The `bool` is `true`
    /// when this call performed the construction.
    pub fn get_or_construct<E>(
        &self,
        key: &ComponentKey,
        construct: impl FnOnce() -> std::result::Result<Instance, E>,
    ) -> std::result::Result<(Instance, bool), E> {
        if let Some(instance) = self.get(key) {
            return Ok((instance, false));
        }

        let cell = Arc::clone(
            self.cells
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .value(),
        );

        let mut constructed = false;
        let instance = cell.get_or_try_init(|| {
            constructed = true;
            construct()
        })?;

        Ok((Arc::clone(instance), constructed))
    }

    /// Number of constructed singletons.
    pub fn len(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.value().get().is_some())
            .count()
    }
}

impl Default for InstanceCache {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl std::fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceCache")
            .field("constructed", &self.len())
            .finish()
    }
}
