//! Builder for MRU stores.
//!
//! Collects the tuning knobs of [`MruMemoryStore`] in one place and hides
//! bucket-count normalization and eviction-ratio validation.
//!
//! ## Example
//!
//! ```rust
//! use mrucache::builder::MruStoreBuilder;
//! use mrucache::store::traits::Store;
//!
//! let store = MruStoreBuilder::new()
//!     .buckets(64)
//!     .max_entries(1_000)
//!     .build::<u64, String>();
//! store.store(1, "hello".to_string()).unwrap();
//! assert_eq!(store.get(&1).as_deref(), Some(&"hello".to_string()));
//! // 64 is promoted to the next odd count.
//! assert_eq!(store.map().bucket_count(), 65);
//! ```

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

use crate::ds::bucket::DEFAULT_BUCKETS;
use crate::error::ConfigError;
use crate::store::bounded::{DEFAULT_FREE_RATIO, MruMemoryStore};
use crate::store::mru::MruBucketMap;

/// Builder for [`MruMemoryStore`] and bare [`MruBucketMap`] instances.
#[derive(Debug, Clone)]
pub struct MruStoreBuilder<S = RandomState> {
    buckets: usize,
    max_entries: Option<usize>,
    free_ratio: f64,
    hasher: S,
}

impl MruStoreBuilder<RandomState> {
    /// Create a builder with 255 buckets, no entry bound and a 10% free ratio.
    pub fn new() -> Self {
        Self {
            buckets: DEFAULT_BUCKETS,
            max_entries: None,
            free_ratio: DEFAULT_FREE_RATIO,
            hasher: RandomState::new(),
        }
    }
}

impl Default for MruStoreBuilder<RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> MruStoreBuilder<S> {
    /// Requested bucket count. Even counts and counts below 17 are promoted.
    pub fn buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets;
        self
    }

    /// Upper bound on live entries; `store` evicts beyond it.
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Fraction of entries evicted by `free`, in `(0, 1]`.
    pub fn free_ratio(mut self, free_ratio: f64) -> Self {
        self.free_ratio = free_ratio;
        self
    }

    /// Replace the hasher used for bucket selection.
    pub fn hasher<S2>(self, hasher: S2) -> MruStoreBuilder<S2> {
        MruStoreBuilder {
            buckets: self.buckets,
            max_entries: self.max_entries,
            free_ratio: self.free_ratio,
            hasher,
        }
    }
}

impl<S: BuildHasher> MruStoreBuilder<S> {
    /// Build a store, clamping invalid settings.
    ///
    /// A zero `max_entries` becomes 1; a `free_ratio` that is not finite or
    /// not positive falls back to the default, and one above 1 becomes 1.
    pub fn build<K, V>(self) -> MruMemoryStore<K, V, S>
    where
        K: Clone + Eq + Hash,
    {
        let max_entries = self.max_entries.map(|max| max.max(1));
        let free_ratio = clamp_free_ratio(self.free_ratio);
        let map = MruBucketMap::with_buckets_and_hasher(self.buckets, self.hasher);
        MruMemoryStore::from_parts(map, max_entries, free_ratio)
    }

    /// Build a store, rejecting invalid settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `max_entries` is zero or `free_ratio`
    /// lies outside `(0, 1]`.
    ///
    /// # Example
    ///
    /// ```
    /// use mrucache::builder::MruStoreBuilder;
    ///
    /// let err = MruStoreBuilder::new()
    ///     .free_ratio(1.5)
    ///     .try_build::<u64, u64>()
    ///     .unwrap_err();
    /// assert!(err.message().contains("free_ratio"));
    /// ```
    pub fn try_build<K, V>(self) -> Result<MruMemoryStore<K, V, S>, ConfigError>
    where
        K: Clone + Eq + Hash,
    {
        if self.max_entries == Some(0) {
            return Err(ConfigError::new("max_entries must be greater than zero"));
        }
        if !(self.free_ratio > 0.0 && self.free_ratio <= 1.0) {
            return Err(ConfigError::new(format!(
                "free_ratio must be in (0, 1], got {}",
                self.free_ratio
            )));
        }
        let map = MruBucketMap::with_buckets_and_hasher(self.buckets, self.hasher);
        Ok(MruMemoryStore::from_parts(
            map,
            self.max_entries,
            self.free_ratio,
        ))
    }

    /// Build only the concurrent map; `max_entries` and `free_ratio` are ignored.
    pub fn build_map<K, V>(self) -> MruBucketMap<K, V, S>
    where
        K: Clone + Eq + Hash,
    {
        MruBucketMap::with_buckets_and_hasher(self.buckets, self.hasher)
    }
}

fn clamp_free_ratio(ratio: f64) -> f64 {
    if !ratio.is_finite() || ratio <= 0.0 {
        DEFAULT_FREE_RATIO
    } else {
        ratio.min(1.0)
    }
}
