//! The store contract consumed by caching call sites.
//!
//! Call sites depend on [`Store`] only, so an unbounded map and a bounded MRU
//! store are interchangeable. Swapping them changes eviction under memory
//! pressure and nothing else a caller can observe.

use std::sync::Arc;

use crate::error::StoreError;

/// Snapshot of store-level metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub updates: u64,
    pub removes: u64,
    pub evictions: u64,
}

/// Thread-safe key/value store used for cached artifacts.
///
/// # Example
///
/// ```
/// use mrucache::store::memory::MemoryStore;
/// use mrucache::store::traits::Store;
///
/// fn warm<S: Store<String, u32>>(store: &S) {
///     store.store("answer".to_string(), 42).unwrap();
/// }
///
/// let store = MemoryStore::new();
/// warm(&store);
/// assert_eq!(store.get(&"answer".to_string()).as_deref(), Some(&42));
/// ```
pub trait Store<K, V>: Send + Sync {
    /// Fetches the value for `key`.
    fn get(&self, key: &K) -> Option<Arc<V>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Persistent backends report I/O failures as [`StoreError::Io`].
    fn store(&self, key: K, value: V) -> Result<(), StoreError>;

    /// Alias of [`store`](Self::store).
    fn hold(&self, key: K, value: V) -> Result<(), StoreError> {
        self.store(key, value)
    }

    /// Removes `key`, returning its value if it was present.
    fn remove(&self, key: &K) -> Option<Arc<V>>;

    fn contains_key(&self, key: &K) -> bool;

    /// Best-effort partial eviction; may do nothing.
    fn free(&self);

    fn clear(&self);

    /// Snapshot of the keys currently stored.
    fn keys(&self) -> std::vec::IntoIter<K>;

    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Snapshot the store's current metrics.
    fn metrics(&self) -> StoreMetrics {
        StoreMetrics::default()
    }
}
