use parking_lot::RwLock;
use slotmap::{Key, SlotMap};
use std::sync::Arc;

/// Thread-safe resource pool keyed by a slotmap handle.
///
/// The pool is the single owner of every live resource of its kind, so its
/// [`len`](Self::len) is the live resource count used to verify that
/// disposal returns to baseline.
pub struct AssetStorage<H: Key, T> {
    map: RwLock<SlotMap<H, Arc<T>>>,
}

impl<H: Key, T> Default for AssetStorage<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Key, T> AssetStorage<H, T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: RwLock::new(SlotMap::with_key()),
        }
    }

    /// [Write] Adds a resource and returns its handle.
    pub fn add(&self, asset: impl Into<T>) -> H {
        self.map.write().insert(Arc::new(asset.into()))
    }

    /// [Write] Removes a resource. Returns `false` if the handle was stale,
    /// which makes double release harmless.
    pub fn remove(&self, handle: H) -> bool {
        self.map.write().remove(handle).is_some()
    }

    /// [Read] Gets a single resource.
    pub fn get(&self, handle: H) -> Option<Arc<T>> {
        self.map.read().get(handle).cloned()
    }

    #[must_use]
    pub fn contains(&self, handle: H) -> bool {
        self.map.read().contains_key(handle)
    }

    /// Number of live resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: Key, T: Clone> AssetStorage<H, T> {
    /// [Write] Mutates a resource in place (copy-on-write if the `Arc` is
    /// shared with a reader). Returns `false` for stale handles.
    pub fn modify(&self, handle: H, f: impl FnOnce(&mut T)) -> bool {
        let mut map = self.map.write();
        match map.get_mut(handle) {
            Some(asset) => {
                f(Arc::make_mut(asset));
                true
            }
            None => false,
        }
    }
}
