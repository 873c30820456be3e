//! # In-Memory Store
//!
//! Thread-safe, cloneable key-value store used as the repository behind
//! every registry in the workspace (DID documents, keys, credentials,
//! policies, requests, submissions, jobs).
//!
//! All operations are synchronous. The lock is `parking_lot`, never held
//! across `.await`, and non-poisoning: a panicking writer does not leave the
//! store permanently unusable.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;

/// Concurrency-safe map with read-after-write consistency.
#[derive(Debug)]
pub struct Store<K, V> {
    data: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K, V> Default for Store<K, V> {
    fn default() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record, returning the previous value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.data.write().insert(key, value)
    }

    /// Insert only if the key is vacant. Returns `false` when the key was
    /// already present (the existing value is left untouched).
    pub fn insert_new(&self, key: K, value: V) -> bool {
        let mut guard = self.data.write();
        if guard.contains_key(&key) {
            return false;
        }
        guard.insert(key, value);
        true
    }

    /// Retrieve a record by key.
    pub fn get(&self, key: &K) -> Option<V> {
        self.data.read().get(key).cloned()
    }

    /// List all records, in no particular order.
    pub fn list(&self) -> Vec<V> {
        self.data.read().values().cloned().collect()
    }

    /// First record matching `pred`, in no particular order.
    pub fn find(&self, pred: impl Fn(&V) -> bool) -> Option<V> {
        self.data.read().values().find(|v| pred(v)).cloned()
    }

    /// Update a record in place. Returns the updated record, or `None` if
    /// not found.
    pub fn update(&self, key: &K, f: impl FnOnce(&mut V)) -> Option<V> {
        let mut guard = self.data.write();
        let entry = guard.get_mut(key)?;
        f(entry);
        Some(entry.clone())
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure runs under the write lock, so the check and the mutation
    /// cannot be interleaved with another writer. Returns `None` if the record
    /// doesn't exist, or `Some(result)` with the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        key: &K,
        f: impl FnOnce(&mut V) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(key).map(f)
    }

    /// Run `f` against the record at `key`, creating it with `init` first
    /// if absent. The whole operation holds the write lock.
    pub fn upsert_with<R, E>(
        &self,
        key: K,
        init: impl FnOnce() -> V,
        f: impl FnOnce(&mut V) -> Result<R, E>,
    ) -> Result<R, E> {
        let mut guard = self.data.write();
        f(guard.entry(key).or_insert_with(init))
    }

    /// The record at `key`, inserting `init()` first if absent.
    pub fn get_or_insert_with(&self, key: K, init: impl FnOnce() -> V) -> V {
        if let Some(v) = self.data.read().get(&key) {
            return v.clone();
        }
        self.data.write().entry(key).or_insert_with(init).clone()
    }

    /// Remove a record by key.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.data.write().remove(key)
    }

    /// Remove the record only if `pred` holds for it, under one lock.
    ///
    /// Returns `None` if absent, `Some(Ok(v))` if removed, and
    /// `Some(Err(v))` with a copy of the retained value otherwise.
    pub fn remove_if(&self, key: &K, pred: impl FnOnce(&V) -> bool) -> Option<Result<V, V>> {
        let mut guard = self.data.write();
        let keep = !pred(guard.get(key)?);
        if keep {
            return guard.get(key).cloned().map(Err);
        }
        guard.remove(key).map(Ok)
    }

    /// Drop every record for which `keep` returns `false`. Returns how many
    /// were removed.
    pub fn retain(&self, mut keep: impl FnMut(&K, &V) -> bool) -> usize {
        let mut guard = self.data.write();
        let before = guard.len();
        guard.retain(|k, v| keep(k, v));
        before - guard.len()
    }

    /// Check if a record exists.
    pub fn contains(&self, key: &K) -> bool {
        self.data.read().contains_key(key)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
