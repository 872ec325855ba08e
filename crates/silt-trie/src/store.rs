//! Concurrent trie store with snapshot reads.

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::trie::Trie;

/// Keeps a value borrowed from a snapshot alive.
///
/// The guard pins the snapshot root it was resolved against, so the value
/// stays readable even after writers publish newer roots.
pub struct ValueGuard<T> {
    _root: Trie<T>,
    value: Arc<T>,
}

impl<T> ValueGuard<T> {
    /// Borrows the value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T> Deref for ValueGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ValueGuard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ValueGuard").field(&self.value).finish()
    }
}

/// Concurrent wrapper around [`Trie`].
///
/// Readers copy the current root under a briefly-held lock and walk the
/// copy lock-free. Writers are serialized on `write_lock`, build the new
/// trie off-lock, and take `root_lock` only for the pointer swap - so a
/// writer never blocks readers, and writers are totally ordered.
pub struct TrieStore<T> {
    /// Guards the snapshot of the current root.
    root: Mutex<Trie<T>>,
    /// Serializes writers.
    write_lock: Mutex<()>,
}

impl<T> Default for TrieStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TrieStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Mutex::new(Trie::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Looks up `key` in the current snapshot.
    ///
    /// The returned guard observes the snapshot taken here for as long as
    /// it lives, regardless of concurrent writes.
    pub fn get(&self, key: &[u8]) -> Option<ValueGuard<T>> {
        let snapshot = self.root.lock().clone();
        let value = snapshot.get_shared(key)?;
        Some(ValueGuard {
            _root: snapshot,
            value,
        })
    }

    /// Maps `key` to `value`.
    pub fn put(&self, key: &[u8], value: T) {
        let _writer = self.write_lock.lock();
        let snapshot = self.root.lock().clone();
        let next = snapshot.put(key, value);
        *self.root.lock() = next;
    }

    /// Unmaps `key`.
    pub fn remove(&self, key: &[u8]) {
        let _writer = self.write_lock.lock();
        let snapshot = self.root.lock().clone();
        let next = snapshot.remove(key);
        *self.root.lock() = next;
    }
}

impl<T> std::fmt::Debug for TrieStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrieStore").finish_non_exhaustive()
    }
}
