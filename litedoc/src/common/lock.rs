use dashmap::DashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::hash::Hash;
use std::sync::Arc;

/// A shared handle to one lock of a [LockRegistry].
pub struct LockHandle {
    lock: Arc<RwLock<()>>,
}

impl LockHandle {
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }
}

/// Hands out one lock per key, e.g. one per document `_id`, so that writers
/// of the same key serialize while writers of different keys do not
/// contend.
pub struct LockRegistry<K: Eq + Hash + Clone> {
    locks: DashMap<K, Arc<RwLock<()>>>,
}

impl<K: Eq + Hash + Clone> LockRegistry<K> {
    pub fn new() -> Self {
        LockRegistry {
            locks: DashMap::new(),
        }
    }

    pub fn get_lock(&self, key: &K) -> LockHandle {
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone();
        LockHandle { lock }
    }

    /// Forgets the lock of `key` unless a handle to it is still alive.
    pub fn release(&self, key: &K) -> bool {
        self.locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1)
            .is_some()
    }

    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    pub fn clear(&self) {
        self.locks.clear();
    }
}

impl<K: Eq + Hash + Clone> Default for LockRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}
