use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::Value;

type Backing = Arc<RwLock<BTreeMap<String, Value>>>;

/// Named attribute values of one record.
///
/// The values live in a reference-counted backing cell. A store produced by
/// [`copy_shared_reference`](Self::copy_shared_reference) points at the same
/// cell as its origin, so an in-place [`set`](Self::set) through either handle
/// is seen by both. [`replace`](Self::replace) and [`detach`](Self::detach)
/// install a new cell for the calling handle only, which ends the sharing.
///
/// Frozen checks are not done here: the owning record guards every write.
#[derive(Debug)]
pub struct AttributeStore {
    backing: Backing,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::from_values(BTreeMap::new())
    }

    pub fn from_values(values: BTreeMap<String, Value>) -> Self {
        Self {
            backing: Arc::new(RwLock::new(values)),
        }
    }

    // The map only ever holds complete values, so a poisoned lock is still
    // consistent and can be used as-is.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Value>> {
        self.backing.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Value>> {
        self.backing.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Updates the value in place and returns the previous one.
    ///
    /// Every handle sharing this backing observes the new value.
    pub fn set(&self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.write().insert(name.into(), value)
    }

    /// A store with the same values and a backing of its own.
    pub fn copy_independent(&self) -> Self {
        Self::from_values(self.values())
    }

    /// A store aliasing this one's backing.
    pub fn copy_shared_reference(&self) -> Self {
        Self {
            backing: Arc::clone(&self.backing),
        }
    }

    /// Swaps in a fresh backing holding `values`.
    ///
    /// Other handles keep the previous backing and no longer see this
    /// store's writes.
    pub fn replace(&mut self, values: BTreeMap<String, Value>) {
        self.backing = Arc::new(RwLock::new(values));
    }

    /// Moves this handle onto a private copy of the current values.
    pub fn detach(&mut self) {
        if self.is_shared() {
            let values = self.values();
            self.replace(values);
        }
    }

    pub fn shares_backing_with(&self, other: &AttributeStore) -> bool {
        Arc::ptr_eq(&self.backing, &other.backing)
    }

    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.backing) > 1
    }

    pub fn values(&self) -> BTreeMap<String, Value> {
        self.read().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl Default for AttributeStore {
    fn default() -> Self {
        Self::new()
    }
}
