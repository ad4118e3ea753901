//! Error types for the mrucache library.
//!
//! ## Key Components
//!
//! - [`StoreError`]: Runtime failures surfaced by stores. Only eviction from
//!   an empty store and backing-store I/O are errors; cache misses and
//!   non-cacheable producers are ordinary control flow.
//! - [`ConfigError`]: Returned when store configuration parameters are invalid
//!   (e.g. zero entry bound, out-of-range free ratio).
//! - [`InvariantError`]: Returned by `check_invariants` when the bucket chains
//!   and the recency list disagree.
//!
//! ## Example Usage
//!
//! ```
//! use mrucache::error::StoreError;
//! use mrucache::store::mru::MruBucketMap;
//!
//! let map: MruBucketMap<&str, i32> = MruBucketMap::new();
//! assert!(matches!(map.remove_last(), Err(StoreError::EmptyStore)));
//! ```

use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Errors reported by [`Store`](crate::store::traits::Store) implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Eviction was requested but the store holds no entries.
    #[error("cannot evict from an empty store")]
    EmptyStore,

    /// A persistent backing store failed. In-memory stores never produce this.
    #[error("backing store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for [`StoreError::EmptyStore`].
    pub fn is_empty_store(&self) -> bool {
        matches!(self, Self::EmptyStore)
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal store invariants are violated.
///
/// Produced by [`MruBucketMap::check_invariants`](crate::store::mru::MruBucketMap::check_invariants).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when store configuration parameters are invalid.
///
/// Produced by [`MruStoreBuilder::try_build`](crate::builder::MruStoreBuilder::try_build).
///
/// # Example
///
/// ```
/// use mrucache::builder::MruStoreBuilder;
///
/// let err = MruStoreBuilder::new().max_entries(0).try_build::<u64, u64>().unwrap_err();
/// assert!(err.to_string().contains("max_entries"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
