//! Unbounded in-memory store.
//!
//! ## Architecture
//! - Keys live in an `FxHashMap<K, Arc<V>>` behind a `parking_lot::RwLock`.
//! - No entry bound: `free` does nothing and nothing is ever evicted.
//!
//! ## When to Use
//! - Small, bounded key spaces where eviction would only cost recomputation.
//! - Tests and fixtures that want the [`Store`] contract without recency.
//!
//! ## Example Usage
//! ```rust
//! use mrucache::store::memory::MemoryStore;
//! use mrucache::store::traits::Store;
//!
//! let store: MemoryStore<u64, String> = MemoryStore::new();
//! store.store(1, "a".to_string()).unwrap();
//! assert!(store.contains_key(&1));
//! store.free();
//! assert_eq!(store.size(), 1);
//! ```

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::StoreError;
use crate::store::counters::StoreCounters;
use crate::store::traits::{Store, StoreMetrics};

/// `RwLock`-guarded hash map implementing [`Store`] without eviction.
#[derive(Debug)]
pub struct MemoryStore<K, V> {
    map: RwLock<FxHashMap<K, Arc<V>>>,
    metrics: StoreCounters,
}

impl<K, V> MemoryStore<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a store with room for `capacity` entries before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: RwLock::new(FxHashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            )),
            metrics: StoreCounters::default(),
        }
    }
}

impl<K, V> Default for MemoryStore<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Store<K, V> for MemoryStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
    fn get(&self, key: &K) -> Option<Arc<V>> {
        let value = self.map.read().get(key).cloned();
        self.metrics.record_lookup(value.is_some());
        value
    }

    fn store(&self, key: K, value: V) -> Result<(), StoreError> {
        let previous = self.map.write().insert(key, Arc::new(value));
        self.metrics.record_write(previous.is_some());
        Ok(())
    }

    fn remove(&self, key: &K) -> Option<Arc<V>> {
        let removed = self.map.write().remove(key);
        if removed.is_some() {
            self.metrics.inc_remove();
        }
        removed
    }

    fn contains_key(&self, key: &K) -> bool {
        self.map.read().contains_key(key)
    }

    fn free(&self) {}

    fn clear(&self) {
        self.map.write().clear();
    }

    fn keys(&self) -> std::vec::IntoIter<K> {
        self.map
            .read()
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
    }

    fn size(&self) -> usize {
        self.map.read().len()
    }

    fn metrics(&self) -> StoreMetrics {
        self.metrics.snapshot()
    }
}
