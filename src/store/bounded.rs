//! [`Store`] backed by the concurrent MRU bucket map.
//!
//! ## Eviction
//!
//! ```text
//!   store(k, v)
//!     └─ map.put(k, v)                 k becomes most recently used
//!     └─ while size > max_entries:
//!          map.remove_last()           drop the least recently used
//!            Err(EmptyStore) ─► stop   (nothing left to evict)
//!
//!   free()
//!     └─ evict ceil(size × free_ratio) entries, at least one if non-empty
//! ```
//!
//! Without `max_entries` the store never evicts on its own; `free` is then
//! the only way entries leave besides `remove` and `clear`.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::counters::StoreCounters;
use crate::store::mru::MruBucketMap;
use crate::store::traits::{Store, StoreMetrics};

/// Fraction of entries `free` evicts when none is configured.
pub const DEFAULT_FREE_RATIO: f64 = 0.1;

/// MRU store with an optional entry bound.
///
/// Build one with [`MruStoreBuilder`](crate::builder::MruStoreBuilder).
///
/// # Example
///
/// ```
/// use mrucache::builder::MruStoreBuilder;
/// use mrucache::store::traits::Store;
///
/// let store = MruStoreBuilder::new().max_entries(2).build::<&str, i32>();
/// store.store("a", 1).unwrap();
/// store.store("b", 2).unwrap();
/// store.get(&"a");
/// store.store("c", 3).unwrap();
///
/// // "b" was least recently used.
/// assert!(!store.contains_key(&"b"));
/// assert_eq!(store.size(), 2);
/// ```
#[derive(Debug)]
pub struct MruMemoryStore<K, V, S = RandomState> {
    map: MruBucketMap<K, V, S>,
    max_entries: Option<usize>,
    free_ratio: f64,
    metrics: StoreCounters,
}

impl<K, V, S> MruMemoryStore<K, V, S>
where
    K: Clone + Eq + Hash,
    S: BuildHasher,
{
    pub(crate) fn from_parts(
        map: MruBucketMap<K, V, S>,
        max_entries: Option<usize>,
        free_ratio: f64,
    ) -> Self {
        Self {
            map,
            max_entries,
            free_ratio,
            metrics: StoreCounters::default(),
        }
    }

    /// The underlying map, for recency diagnostics and scans.
    pub fn map(&self) -> &MruBucketMap<K, V, S> {
        &self.map
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    pub fn free_ratio(&self) -> f64 {
        self.free_ratio
    }

    /// Evicts up to `count` least recently used entries; returns how many went.
    pub fn evict(&self, count: usize) -> usize {
        let mut evicted = 0;
        while evicted < count {
            match self.map.remove_last() {
                Ok(_) => {
                    self.metrics.inc_eviction();
                    evicted += 1;
                },
                Err(err) => {
                    warn!(%err, requested = count, evicted, "eviction stopped early");
                    break;
                },
            }
        }
        evicted
    }

    fn enforce_bound(&self) {
        let Some(max) = self.max_entries else {
            return;
        };
        let mut evicted = 0usize;
        // size() also counts other writers' pending inserts.
        while self.map.size() > max {
            match self.map.remove_last() {
                Ok(_) => {
                    self.metrics.inc_eviction();
                    evicted += 1;
                },
                Err(err) => {
                    warn!(%err, max_entries = max, "bound enforcement stopped early");
                    break;
                },
            }
        }
        if evicted > 0 {
            debug!(evicted, max_entries = max, "evicted over-bound entries");
        }
    }
}

impl<K, V, S> Store<K, V> for MruMemoryStore<K, V, S>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Send + Sync,
    S: BuildHasher + Send + Sync,
{
    fn get(&self, key: &K) -> Option<Arc<V>> {
        let value = self.map.get(key);
        self.metrics.record_lookup(value.is_some());
        value
    }

    fn store(&self, key: K, value: V) -> Result<(), StoreError> {
        let previous = self.map.put(key, Arc::new(value));
        self.metrics.record_write(previous.is_some());
        if previous.is_none() {
            self.enforce_bound();
        }
        Ok(())
    }

    fn remove(&self, key: &K) -> Option<Arc<V>> {
        let removed = self.map.remove(key);
        if removed.is_some() {
            self.metrics.inc_remove();
        }
        removed
    }

    fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn free(&self) {
        let size = self.map.size();
        if size == 0 {
            return;
        }
        let target = ((size as f64) * self.free_ratio).ceil() as usize;
        let evicted = self.evict(target.max(1));
        debug!(evicted, remaining = self.map.size(), "freed mru store entries");
    }

    fn clear(&self) {
        self.map.clear();
    }

    fn keys(&self) -> std::vec::IntoIter<K> {
        self.map.keys_by_recency().into_iter()
    }

    fn size(&self) -> usize {
        self.map.size()
    }

    fn metrics(&self) -> StoreMetrics {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MruStoreBuilder;

    fn bounded(max: usize) -> MruMemoryStore<u32, u32> {
        MruStoreBuilder::new().max_entries(max).build()
    }

    #[test]
    fn unbounded_store_never_evicts_on_store() {
        let store: MruMemoryStore<u32, u32> = MruStoreBuilder::new().build();
        for i in 0..1000 {
            store.store(i, i).unwrap();
        }
        assert_eq!(store.size(), 1000);
        assert_eq!(store.metrics().evictions, 0);
    }

    #[test]
    fn bound_evicts_least_recently_used() {
        let store = bounded(3);
        for i in 0..3 {
            store.store(i, i * 10).unwrap();
        }
        assert_eq!(store.get(&0).as_deref(), Some(&0));
        store.store(3, 30).unwrap();

        assert!(store.contains_key(&0), "recently read entry survives");
        assert!(!store.contains_key(&1), "least recently used is evicted");
        assert_eq!(store.size(), 3);
        assert_eq!(store.metrics().evictions, 1);
    }

    #[test]
    fn updating_existing_key_does_not_evict() {
        let store = bounded(2);
        store.store(1, 1).unwrap();
        store.store(2, 2).unwrap();
        store.store(1, 100).unwrap();
        assert_eq!(store.size(), 2);
        assert_eq!(store.get(&1).as_deref(), Some(&100));
        assert_eq!(store.metrics().updates, 1);
    }

    #[test]
    fn free_evicts_ratio_rounded_up() {
        let store: MruMemoryStore<u32, u32> = MruStoreBuilder::new().free_ratio(0.25).build();
        for i in 0..10 {
            store.store(i, i).unwrap();
        }
        store.free();
        // ceil(10 * 0.25) = 3, oldest first.
        assert_eq!(store.size(), 7);
        for i in 0..3 {
            assert!(!store.contains_key(&i));
        }
        assert!(store.contains_key(&3));
    }

    #[test]
    fn free_evicts_at_least_one_and_tolerates_empty() {
        let store = bounded(10);
        store.free();
        assert_eq!(store.size(), 0);

        store.store(7, 7).unwrap();
        store.free();
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn evict_stops_on_empty_store() {
        let store = bounded(10);
        store.store(1, 1).unwrap();
        assert_eq!(store.evict(5), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn keys_come_back_in_recency_order() {
        let store = bounded(10);
        store.store(1, 1).unwrap();
        store.store(2, 2).unwrap();
        store.store(3, 3).unwrap();
        store.get(&1);
        assert_eq!(store.keys().collect::<Vec<_>>(), vec![1, 3, 2]);
    }

    #[test]
    fn hold_clear_and_remove() {
        let store = bounded(4);
        store.hold(1, 1).unwrap();
        assert_eq!(store.remove(&1).as_deref(), Some(&1));
        assert_eq!(store.remove(&1), None);
        store.hold(2, 2).unwrap();
        store.clear();
        assert!(store.is_empty());
        store.map().check_invariants().unwrap();
    }
}
