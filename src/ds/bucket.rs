//! Hash buckets: bucket selection and per-bucket collision chains.
//!
//! ## Architecture
//!
//! ```text
//!   key ──► BucketSelector { buckets: 255, hasher } ──► hash_one(key) % 255
//!                                                             │
//!            ┌────────────┬────────────┬─────────┬────────────┘
//!            ▼            ▼            ▼         ▼
//!        Bucket 0     Bucket 1      ...      Bucket 254
//!        head ─► e1 ─► e7             head ─► e3
//!
//!   BucketChain: singly linked by SlotId inside its own SlotArena.
//!   Each entry records the RecencyHandle of its node in the recency list.
//! ```
//!
//! ## Bucket Counts
//!
//! Counts below [`MIN_BUCKETS`] are raised to it and even counts are bumped
//! to the next odd number, so the modulus is never a power of two and hashes
//! with weak low bits still spread across buckets.

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use crate::ds::recency::RecencyHandle;
use crate::ds::slot_arena::{SlotArena, SlotId};

/// Bucket count used when none is configured.
pub const DEFAULT_BUCKETS: usize = 255;

/// Smallest bucket count a store will use.
pub const MIN_BUCKETS: usize = 17;

/// Normalizes a requested bucket count: at least [`MIN_BUCKETS`], always odd.
///
/// # Example
///
/// ```
/// use mrucache::ds::bucket::normalize_bucket_count;
///
/// assert_eq!(normalize_bucket_count(255), 255);
/// assert_eq!(normalize_bucket_count(256), 257);
/// assert_eq!(normalize_bucket_count(4), 17);
/// ```
pub fn normalize_bucket_count(requested: usize) -> usize {
    let count = requested.max(MIN_BUCKETS);
    if count % 2 == 0 { count + 1 } else { count }
}

/// Deterministic key-to-bucket mapping.
///
/// The same `(key, hasher)` pair always maps to the same bucket in
/// `[0, bucket_count)`.
#[derive(Debug, Clone)]
pub struct BucketSelector<S> {
    buckets: usize,
    hasher: S,
}

impl<S: BuildHasher> BucketSelector<S> {
    /// Creates a selector over a normalized bucket count.
    pub fn new(requested: usize, hasher: S) -> Self {
        Self {
            buckets: normalize_bucket_count(requested),
            hasher,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets
    }

    /// Maps a key to its bucket index.
    pub fn bucket_for<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        (self.hasher.hash_one(key) % self.buckets as u64) as usize
    }
}

/// One entry of a bucket chain.
#[derive(Debug)]
pub struct ChainEntry<K, V> {
    pub(crate) key: K,
    pub(crate) value: Arc<V>,
    pub(crate) handle: RecencyHandle,
    next: Option<SlotId>,
}

impl<K, V> ChainEntry<K, V> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &Arc<V> {
        &self.value
    }

    pub fn handle(&self) -> RecencyHandle {
        self.handle
    }
}

/// Singly linked collision chain for one bucket.
#[derive(Debug)]
pub struct BucketChain<K, V> {
    arena: SlotArena<ChainEntry<K, V>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<K, V> BucketChain<K, V> {
    pub fn new() -> Self {
        Self {
            arena: SlotArena::new(),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Entries in chain order.
    pub fn iter(&self) -> ChainIter<'_, K, V> {
        ChainIter {
            chain: self,
            current: self.head,
        }
    }

    /// Appends an entry at the end of the chain.
    pub fn append(&mut self, key: K, value: Arc<V>, handle: RecencyHandle) {
        let id = self.arena.insert(ChainEntry {
            key,
            value,
            handle,
            next: None,
        });
        match self.tail {
            Some(tail) => {
                if let Some(entry) = self.arena.get_mut(tail) {
                    entry.next = Some(id);
                }
            },
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }
}

impl<K, V> BucketChain<K, V>
where
    K: Eq,
{
    fn position<Q>(&self, key: &Q) -> Option<(Option<SlotId>, SlotId)>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut prev = None;
        let mut current = self.head;
        while let Some(id) = current {
            let entry = self.arena.get(id)?;
            if entry.key.borrow() == key {
                return Some((prev, id));
            }
            prev = Some(id);
            current = entry.next;
        }
        None
    }

    pub fn find<Q>(&self, key: &Q) -> Option<&ChainEntry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let (_, id) = self.position(key)?;
        self.arena.get(id)
    }

    pub fn find_mut<Q>(&mut self, key: &Q) -> Option<&mut ChainEntry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let (_, id) = self.position(key)?;
        self.arena.get_mut(id)
    }

    /// Splices the entry for `key` out of the chain.
    pub fn unlink<Q>(&mut self, key: &Q) -> Option<ChainEntry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let (prev, id) = self.position(key)?;
        let entry = self.arena.remove(id)?;
        match prev {
            Some(prev) => {
                if let Some(prev_entry) = self.arena.get_mut(prev) {
                    prev_entry.next = entry.next;
                }
            },
            None => self.head = entry.next,
        }
        if self.tail == Some(id) {
            self.tail = prev;
        }
        Some(entry)
    }
}

impl<K, V> Default for BucketChain<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a chain from head to tail.
pub struct ChainIter<'a, K, V> {
    chain: &'a BucketChain<K, V>,
    current: Option<SlotId>,
}

impl<'a, K, V> Iterator for ChainIter<'a, K, V> {
    type Item = &'a ChainEntry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let entry = self.chain.arena.get(id)?;
        self.current = entry.next;
        Some(entry)
    }
}
