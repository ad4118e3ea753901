//! The last good result for a cache key.
//!
//! A [`CachedEntry`] pairs the validity tokens recorded for each sub-key with
//! the produced payload. Entries are immutable: recomputation builds a new
//! entry and replaces the old one in the store.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::validity::Validity;

/// Recorded validities plus an opaque payload.
///
/// # Example
///
/// ```
/// use mrucache::entry::CachedEntry;
/// use mrucache::validity::Validity;
///
/// let entry = CachedEntry::builder("rendered page")
///     .validity("source.xml", Validity::timestamp(100))
///     .build();
///
/// assert!(entry.is_valid("source.xml", &Validity::timestamp(100)));
/// assert!(!entry.is_valid("source.xml", &Validity::timestamp(101)));
/// assert!(!entry.is_valid("other.xml", &Validity::timestamp(100)));
/// ```
#[derive(Debug)]
pub struct CachedEntry<S, P> {
    validity_map: FxHashMap<S, Validity>,
    payload: Arc<P>,
}

impl<S, P> CachedEntry<S, P>
where
    S: Eq + Hash,
{
    /// Creates an entry from a complete validity map.
    pub fn new(validity_map: FxHashMap<S, Validity>, payload: P) -> Self {
        Self {
            validity_map,
            payload: Arc::new(payload),
        }
    }

    /// Starts an entry for `payload`; add validities before building.
    pub fn builder(payload: P) -> CachedEntryBuilder<S, P> {
        CachedEntryBuilder {
            validity_map: FxHashMap::default(),
            payload,
        }
    }

    /// Checks `current` against the validity recorded for `sub_key`.
    ///
    /// Unknown sub-keys are never valid.
    pub fn is_valid<Q>(&self, sub_key: &Q, current: &Validity) -> bool
    where
        S: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.validity_map
            .get(sub_key)
            .is_some_and(|recorded| recorded.is_valid(current))
    }

    /// Checks every `(sub_key, current)` pair; all must be valid.
    ///
    /// An empty iterator is vacuously valid.
    pub fn is_valid_all<'a, Q, I>(&self, current: I) -> bool
    where
        S: Borrow<Q>,
        Q: Eq + Hash + ?Sized + 'a,
        I: IntoIterator<Item = (&'a Q, &'a Validity)>,
    {
        current
            .into_iter()
            .all(|(sub_key, validity)| self.is_valid(sub_key, validity))
    }

    /// The validity recorded for `sub_key`, if any.
    pub fn validity<Q>(&self, sub_key: &Q) -> Option<&Validity>
    where
        S: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.validity_map.get(sub_key)
    }

    /// Number of recorded sub-keys.
    pub fn sub_key_count(&self) -> usize {
        self.validity_map.len()
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Shared handle to the payload.
    pub fn payload_arc(&self) -> Arc<P> {
        Arc::clone(&self.payload)
    }
}

/// Builder returned by [`CachedEntry::builder`].
#[derive(Debug)]
pub struct CachedEntryBuilder<S, P> {
    validity_map: FxHashMap<S, Validity>,
    payload: P,
}

impl<S, P> CachedEntryBuilder<S, P>
where
    S: Eq + Hash,
{
    /// Records the validity for `sub_key`, replacing any earlier one.
    pub fn validity(mut self, sub_key: S, validity: Validity) -> Self {
        self.validity_map.insert(sub_key, validity);
        self
    }

    pub fn build(self) -> CachedEntry<S, P> {
        CachedEntry::new(self.validity_map, self.payload)
    }
}
