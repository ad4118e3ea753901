//! Concurrent MRU bucket map.
//!
//! A thread-safe key/value map that keeps a global most-recently-used order
//! and exposes [`MruBucketMap::remove_last`] to evict the least recently used
//! entry. Eviction policy (when to call it) belongs to the caller, usually
//! [`MruMemoryStore`](crate::store::bounded::MruMemoryStore).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                       MruBucketMap<K, V, S> Layout                       │
//! │                                                                          │
//! │   buckets: [Mutex<BucketChain>; N]      (N odd, ≥ 17, default 255)       │
//! │   ┌────────┐ ┌────────┐ ┌────────┐       ┌────────┐                      │
//! │   │ lock 0 │ │ lock 1 │ │ lock 2 │  ...  │lock N-1│                      │
//! │   │ e1─►e7 │ │   ∅    │ │  e3    │       │ e2─►e5 │                      │
//! │   └───┬────┘ └────────┘ └───┬────┘       └───┬────┘                      │
//! │       │ handle               │ handle        │ handle                    │
//! │       ▼                      ▼               ▼                           │
//! │   recency: Mutex<RecencyList<K>>                                         │
//! │   [header] ─► e3 (MRU) ─► e1 ─► e5 ─► e7 ─► e2 (LRU) ─► [header]         │
//! │                                                                          │
//! │   size: AtomicUsize       mirror of the recency node count               │
//! │   generation: AtomicU64   bumped by clear()                              │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lock Discipline
//!
//! `put`, `get` and `remove` take one bucket lock, finish the chain work,
//! release it, and only then take the recency lock. The two scopes are never
//! held together on these paths, so they cannot deadlock against each other.
//! `clear` and `check_invariants` are the only operations holding both, always
//! recency first and then buckets in index order.
//!
//! A new key is published in three steps: a pending recency node is pushed
//! (recency lock), then the chain is re-checked and the entry appended
//! (bucket lock). If another thread inserted the same key in between, the
//! pending node is dropped and the winner's node is promoted instead. If a
//! `clear` ran in between, the put is ordered before the clear and discarded.
//!
//! ## Consistency
//!
//! Per-key operations are linearizable through the bucket lock. Recency order
//! is best effort under concurrency: a concurrent scan can observe an entry
//! whose promotion has not happened yet, and `size` may briefly count a
//! pending node.
//!
//! ## Operations
//!
//! | Operation        | Time    | Locks                     |
//! |------------------|---------|---------------------------|
//! | `put`            | O(1)*   | bucket, then recency      |
//! | `get`            | O(1)*   | bucket, then recency      |
//! | `remove`         | O(1)*   | bucket, then recency      |
//! | `contains_key`   | O(1)*   | bucket only (no promote)  |
//! | `remove_last`    | O(1)*   | recency, then `remove`    |
//! | `key_set` etc.   | O(n)    | each bucket in turn       |
//! | `clear`          | O(n)    | recency + all buckets     |
//!
//! *Expected, proportional to chain length.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use mrucache::store::mru::MruBucketMap;
//!
//! let map = MruBucketMap::new();
//! map.put("a", Arc::new(1));
//! map.put("b", Arc::new(2));
//! map.put("c", Arc::new(3));
//!
//! // Reading "a" promotes it, so "b" is now least recently used.
//! assert_eq!(map.get("a").as_deref(), Some(&1));
//! let (key, value) = map.remove_last().unwrap();
//! assert_eq!((key, *value), ("b", 2));
//! ```

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::ds::bucket::{BucketChain, BucketSelector, DEFAULT_BUCKETS};
use crate::ds::recency::RecencyList;
use crate::error::{InvariantError, StoreError};

/// Concurrent hash map with a global recency list and LRU eviction primitive.
///
/// # Type Parameters
///
/// - `K`: Key type, must be `Clone + Eq + Hash` (a copy lives in the recency list)
/// - `V`: Value type, handed out as `Arc<V>`
/// - `S`: Hasher used for bucket selection
pub struct MruBucketMap<K, V, S = RandomState> {
    buckets: Box<[Mutex<BucketChain<K, V>>]>,
    selector: BucketSelector<S>,
    recency: Mutex<RecencyList<K>>,
    size: AtomicUsize,
    generation: AtomicU64,
}

impl<K, V> MruBucketMap<K, V, RandomState>
where
    K: Clone + Eq + Hash,
{
    /// Creates a map with [`DEFAULT_BUCKETS`] buckets.
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKETS)
    }

    /// Creates a map with a normalized bucket count (odd, at least 17).
    ///
    /// ```
    /// use mrucache::store::mru::MruBucketMap;
    ///
    /// let map: MruBucketMap<u64, u64> = MruBucketMap::with_buckets(64);
    /// assert_eq!(map.bucket_count(), 65);
    /// ```
    pub fn with_buckets(buckets: usize) -> Self {
        Self::with_buckets_and_hasher(buckets, RandomState::new())
    }
}

impl<K, V, S> MruBucketMap<K, V, S>
where
    K: Clone + Eq + Hash,
    S: BuildHasher,
{
    /// Creates a map with a normalized bucket count and a custom hasher.
    pub fn with_buckets_and_hasher(buckets: usize, hasher: S) -> Self {
        let selector = BucketSelector::new(buckets, hasher);
        let buckets = (0..selector.bucket_count())
            .map(|_| Mutex::new(BucketChain::new()))
            .collect();
        Self {
            buckets,
            selector,
            recency: Mutex::new(RecencyList::new()),
            size: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
        }
    }

    /// Number of hash buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of live entries.
    ///
    /// Mirrors the recency list length, so while a `put` of a new key is in
    /// flight its pending node is already counted.
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn bucket<Q: Hash + ?Sized>(&self, key: &Q) -> &Mutex<BucketChain<K, V>> {
        &self.buckets[self.selector.bucket_for(key)]
    }

    /// Inserts or replaces the value for `key` and marks it most recently used.
    ///
    /// Returns the replaced value, or `None` if the key was new.
    pub fn put(&self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        let bucket = self.bucket(&key);

        {
            let mut chain = bucket.lock();
            if let Some(entry) = chain.find_mut(&key) {
                let previous = std::mem::replace(&mut entry.value, value);
                let handle = entry.handle;
                drop(chain);
                self.recency.lock().move_to_front(handle);
                return Some(previous);
            }
        }

        let (pending, generation) = {
            let mut recency = self.recency.lock();
            let handle = recency.push_front(key.clone());
            self.size.store(recency.len(), Ordering::Relaxed);
            (handle, self.generation.load(Ordering::Relaxed))
        };

        let mut chain = bucket.lock();
        if self.generation.load(Ordering::Relaxed) != generation {
            // clear() already dropped the pending node.
            return None;
        }
        if let Some(entry) = chain.find_mut(&key) {
            let previous = std::mem::replace(&mut entry.value, value);
            let winner = entry.handle;
            drop(chain);
            let mut recency = self.recency.lock();
            recency.remove(pending);
            recency.move_to_front(winner);
            self.size.store(recency.len(), Ordering::Relaxed);
            return Some(previous);
        }
        chain.append(key, value, pending);
        None
    }

    /// Returns the value for `key` and marks it most recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let (value, handle) = {
            let chain = self.bucket(key).lock();
            let entry = chain.find(key)?;
            (Arc::clone(&entry.value), entry.handle)
        };
        self.recency.lock().move_to_front(handle);
        Some(value)
    }

    /// Removes `key`, returning its value. Absent keys are a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the removed entry has no recency node and no `clear` ran
    /// concurrently, which means the lock discipline was broken.
    pub fn remove<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let (entry, generation) = {
            let mut chain = self.bucket(key).lock();
            let entry = chain.unlink(key)?;
            (entry, self.generation.load(Ordering::Relaxed))
        };

        let mut recency = self.recency.lock();
        let unlinked = recency.remove(entry.handle).is_some();
        assert!(
            unlinked || self.generation.load(Ordering::Relaxed) != generation,
            "bucket entry had no recency node"
        );
        self.size.store(recency.len(), Ordering::Relaxed);
        Some(entry.value)
    }

    /// Returns `true` if `key` is present. Does not change recency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.bucket(key).lock().find(key).is_some()
    }

    /// Evicts the least recently used entry.
    ///
    /// Delegates to [`remove`](Self::remove) with the tail's key so that the
    /// bucket chain and the recency list stay consistent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyStore`] if there is nothing to evict.
    pub fn remove_last(&self) -> Result<(K, Arc<V>), StoreError> {
        loop {
            let key = {
                let recency = self.recency.lock();
                match recency.back() {
                    Some((_, key)) => key.clone(),
                    None => return Err(StoreError::EmptyStore),
                }
            };
            if let Some(value) = self.remove(&key) {
                return Ok((key, value));
            }
            // The tail is a pending insert or was removed concurrently.
            std::thread::yield_now();
        }
    }

    /// Key of the least recently used entry, without removing it.
    pub fn peek_last(&self) -> Option<K> {
        self.recency.lock().back().map(|(_, key)| key.clone())
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<K> {
        self.recency.lock().iter().cloned().collect()
    }

    /// All keys, collected bucket by bucket.
    pub fn key_set(&self) -> FxHashSet<K> {
        let mut keys = FxHashSet::default();
        for bucket in self.buckets.iter() {
            let chain = bucket.lock();
            keys.extend(chain.iter().map(|entry| entry.key.clone()));
        }
        keys
    }

    /// All values, in no particular order.
    ///
    /// Like the other full scans this walks the buckets one lock at a time
    /// rather than the recency list, so writers to other buckets are not
    /// blocked for the whole scan.
    pub fn values(&self) -> Vec<Arc<V>> {
        let mut values = Vec::with_capacity(self.size());
        for bucket in self.buckets.iter() {
            let chain = bucket.lock();
            values.extend(chain.iter().map(|entry| Arc::clone(&entry.value)));
        }
        values
    }

    /// All entries, in no particular order. Scans bucket by bucket.
    pub fn entry_set(&self) -> Vec<(K, Arc<V>)> {
        let mut entries = Vec::with_capacity(self.size());
        for bucket in self.buckets.iter() {
            let chain = bucket.lock();
            entries.extend(
                chain
                    .iter()
                    .map(|entry| (entry.key.clone(), Arc::clone(&entry.value))),
            );
        }
        entries
    }

    /// Returns `true` if any entry holds a value equal to `value`. Scans
    /// bucket by bucket.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.buckets.iter().any(|bucket| {
            bucket
                .lock()
                .iter()
                .any(|entry| entry.value.as_ref() == value)
        })
    }

    /// Drops every entry and resets the recency list.
    pub fn clear(&self) {
        let mut recency = self.recency.lock();
        let mut chains: Vec<_> = self.buckets.iter().map(|bucket| bucket.lock()).collect();
        self.generation.fetch_add(1, Ordering::Relaxed);
        let dropped = recency.len();
        for chain in chains.iter_mut() {
            chain.clear();
        }
        recency.clear();
        self.size.store(0, Ordering::Relaxed);
        trace!(dropped, "cleared mru bucket map");
    }

    /// Verifies that every bucket entry has exactly one live recency node with
    /// the same key, that entries sit in the bucket their key hashes to, and
    /// that the counts agree.
    ///
    /// Intended for tests and quiescent diagnostics: an in-flight `put` holds a
    /// pending node that this check reports as an orphan.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let recency = self.recency.lock();
        let chains: Vec<_> = self.buckets.iter().map(|bucket| bucket.lock()).collect();

        recency.check_invariants()?;

        let mut chained = 0usize;
        for (idx, chain) in chains.iter().enumerate() {
            for entry in chain.iter() {
                chained += 1;
                if self.selector.bucket_for(&entry.key) != idx {
                    return Err(InvariantError::new(format!(
                        "entry found in bucket {idx} but hashes elsewhere"
                    )));
                }
                match recency.key(entry.handle) {
                    Some(key) if *key == entry.key => {},
                    Some(_) => {
                        return Err(InvariantError::new(
                            "recency node belongs to a different key",
                        ));
                    },
                    None => {
                        return Err(InvariantError::new("bucket entry has no recency node"));
                    },
                }
            }
            if chain.iter().count() != chain.len() {
                return Err(InvariantError::new(format!(
                    "bucket {idx} chain length disagrees with its arena"
                )));
            }
        }

        if chained != recency.len() {
            return Err(InvariantError::new(format!(
                "{chained} chained entries but {} recency nodes",
                recency.len()
            )));
        }
        if self.size() != chained {
            return Err(InvariantError::new(format!(
                "size counter {} but {chained} entries",
                self.size()
            )));
        }
        Ok(())
    }
}

impl<K, V> Default for MruBucketMap<K, V, RandomState>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> fmt::Debug for MruBucketMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MruBucketMap")
            .field("buckets", &self.buckets.len())
            .field("size", &self.size.load(Ordering::Relaxed))
            .finish()
    }
}
