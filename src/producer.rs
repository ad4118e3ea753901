//! Validity-checked lookup over any [`Store`].
//!
//! A unit of work is described by the ordered [`Component`]s that produce it.
//! Each component reports a cache key and a validity token through
//! [`Cacheable`]; together they decide whether a stored result can be reused.
//!
//! ## Lookup Flow
//!
//! ```text
//!   components ──► generate_key / generate_validity
//!                    any None or uncacheable ──► Bypass (compute, no store)
//!                    │
//!                    ▼
//!                  CacheKey ──► store.get
//!                    entry present, every validity holds ──► Hit
//!                    otherwise ──► compute, store new entry ──► Miss
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use mrucache::entry::CachedEntry;
//! use mrucache::key::{CacheKey, ComponentKind};
//! use mrucache::producer::{Cacheable, Component, Lookup, ValidityCache};
//! use mrucache::store::memory::MemoryStore;
//! use mrucache::validity::Validity;
//!
//! struct Source { mtime: i64 }
//!
//! impl Cacheable for Source {
//!     fn generate_key(&self) -> Option<u64> { Some(1) }
//!     fn generate_validity(&self) -> Option<Validity> { Some(Validity::timestamp(self.mtime)) }
//! }
//!
//! let cache = ValidityCache::new(MemoryStore::<CacheKey, CachedEntry<String, String>>::new());
//! let source = Source { mtime: 10 };
//! let parts = [Component::new(ComponentKind::Generator, "file", &source)];
//!
//! let first = cache.fetch_or_compute(&parts, || "rendered".to_string()).unwrap();
//! assert!(matches!(first, Lookup::Miss(_)));
//! let second = cache.fetch_or_compute(&parts, || unreachable!()).unwrap();
//! assert!(second.is_hit());
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::entry::CachedEntry;
use crate::error::StoreError;
use crate::key::{CacheKey, ComponentKey, ComponentKind, KeyPart};
use crate::store::traits::Store;
use crate::validity::Validity;

/// A pipeline stage whose output may be cached.
pub trait Cacheable {
    /// Key identifying this stage's output, or `None` when the output must
    /// not be cached for this invocation.
    fn generate_key(&self) -> Option<u64>;

    /// Token proving the output is still current, or `None` when the output
    /// must not be cached for this invocation.
    fn generate_validity(&self) -> Option<Validity>;
}

/// One stage of a unit of work.
#[derive(Clone, Copy)]
pub struct Component<'a> {
    kind: ComponentKind,
    id: &'a str,
    producer: &'a dyn Cacheable,
}

impl<'a> Component<'a> {
    pub fn new(kind: ComponentKind, id: &'a str, producer: &'a dyn Cacheable) -> Self {
        Self { kind, id, producer }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn id(&self) -> &'a str {
        self.id
    }
}

impl fmt::Debug for Component<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Outcome of [`ValidityCache::fetch_or_compute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<P> {
    /// A stored entry was still valid.
    Hit(Arc<P>),
    /// The payload was computed and stored.
    Miss(Arc<P>),
    /// Some component was not cacheable; the payload was computed and not stored.
    Bypass(Arc<P>),
}

impl<P> Lookup<P> {
    pub fn payload(&self) -> &Arc<P> {
        match self {
            Self::Hit(payload) | Self::Miss(payload) | Self::Bypass(payload) => payload,
        }
    }

    pub fn into_payload(self) -> Arc<P> {
        match self {
            Self::Hit(payload) | Self::Miss(payload) | Self::Bypass(payload) => payload,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Current key material for one component.
struct Probe {
    key: ComponentKey,
    sub_key: String,
    validity: Validity,
}

/// Caches payloads keyed by their components, reusing them while every
/// component's validity still holds.
pub struct ValidityCache<St, P> {
    store: St,
    _payload: PhantomData<fn() -> P>,
}

impl<St, P> ValidityCache<St, P>
where
    St: Store<CacheKey, CachedEntry<String, P>>,
{
    pub fn new(store: St) -> Self {
        Self {
            store,
            _payload: PhantomData,
        }
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn into_inner(self) -> St {
        self.store
    }

    /// Returns the cached payload for `components` if still valid, otherwise
    /// runs `compute` and stores its result.
    ///
    /// An empty component list, or any component reporting no key, no
    /// validity, or a [`Validity::Never`] token, bypasses the store.
    ///
    /// # Errors
    ///
    /// Propagates the store's error when writing a recomputed entry fails.
    pub fn fetch_or_compute<F>(
        &self,
        components: &[Component<'_>],
        compute: F,
    ) -> Result<Lookup<P>, StoreError>
    where
        F: FnOnce() -> P,
    {
        let Some(probes) = probe(components) else {
            debug!(components = components.len(), "bypassing cache");
            return Ok(Lookup::Bypass(Arc::new(compute())));
        };
        let key = CacheKey::from_parts(probes.iter().map(|probe| &probe.key));

        if let Some(entry) = self.store.get(&key) {
            let valid = probes
                .iter()
                .all(|probe| entry.is_valid(probe.sub_key.as_str(), &probe.validity));
            if valid {
                trace!(%key, "cache hit");
                return Ok(Lookup::Hit(entry.payload_arc()));
            }
            trace!(%key, "cached entry is stale");
        }

        let entry = probes
            .into_iter()
            .fold(CachedEntry::builder(compute()), |builder, probe| {
                builder.validity(probe.sub_key, probe.validity)
            })
            .build();
        let payload = entry.payload_arc();
        self.store.store(key, entry)?;
        Ok(Lookup::Miss(payload))
    }
}

impl<St: fmt::Debug, P> fmt::Debug for ValidityCache<St, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidityCache")
            .field("store", &self.store)
            .finish()
    }
}

fn probe(components: &[Component<'_>]) -> Option<Vec<Probe>> {
    if components.is_empty() {
        return None;
    }
    components
        .iter()
        .map(|component| {
            let key = component.producer.generate_key()?;
            let validity = component.producer.generate_validity()?;
            if !validity.is_cacheable() {
                return None;
            }
            let key = ComponentKey::new(component.kind, component.id, key);
            Some(Probe {
                sub_key: key.key_part().into_owned(),
                key,
                validity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::builder::MruStoreBuilder;
    use crate::store::memory::MemoryStore;

    type Cache<P> = ValidityCache<MemoryStore<CacheKey, CachedEntry<String, P>>, P>;

    fn cache<P: Send + Sync>() -> Cache<P> {
        ValidityCache::new(MemoryStore::new())
    }

    struct Stage {
        key: Option<u64>,
        validity: Option<Validity>,
    }

    impl Stage {
        fn at(stamp: i64) -> Self {
            Self {
                key: Some(1),
                validity: Some(Validity::timestamp(stamp)),
            }
        }
    }

    impl Cacheable for Stage {
        fn generate_key(&self) -> Option<u64> {
            self.key
        }

        fn generate_validity(&self) -> Option<Validity> {
            self.validity.clone()
        }
    }

    fn counting<'a>(calls: &'a Cell<u32>, value: &'static str) -> impl FnOnce() -> String + 'a {
        move || {
            calls.set(calls.get() + 1);
            value.to_string()
        }
    }

    #[test]
    fn miss_then_hit() {
        let cache = cache();
        let calls = Cell::new(0);
        let source = Stage::at(100);
        let parts = [Component::new(ComponentKind::Generator, "file", &source)];

        let first = cache.fetch_or_compute(&parts, counting(&calls, "a")).unwrap();
        assert_eq!(first, Lookup::Miss(Arc::new("a".to_string())));
        let second = cache.fetch_or_compute(&parts, counting(&calls, "b")).unwrap();
        assert_eq!(second, Lookup::Hit(Arc::new("a".to_string())));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.store().size(), 1);
    }

    #[test]
    fn changed_validity_recomputes_and_replaces() {
        let cache = cache();
        let calls = Cell::new(0);

        let old = Stage::at(100);
        let parts = [Component::new(ComponentKind::Generator, "file", &old)];
        cache.fetch_or_compute(&parts, counting(&calls, "old")).unwrap();

        let fresh = Stage::at(101);
        let parts = [Component::new(ComponentKind::Generator, "file", &fresh)];
        let result = cache.fetch_or_compute(&parts, counting(&calls, "new")).unwrap();
        assert_eq!(result, Lookup::Miss(Arc::new("new".to_string())));

        let again = cache.fetch_or_compute(&parts, counting(&calls, "x")).unwrap();
        assert_eq!(again.into_payload().as_str(), "new");
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.store().size(), 1);
    }

    #[test]
    fn uncacheable_component_bypasses_store() {
        let cache = cache();
        let generator = Stage::at(1);
        let no_key = Stage {
            key: None,
            validity: Some(Validity::Always),
        };
        let no_validity = Stage {
            key: Some(2),
            validity: None,
        };
        let never = Stage {
            key: Some(3),
            validity: Some(Validity::composite(Validity::Always, Validity::Never)),
        };

        for stage in [&no_key, &no_validity, &never] {
            let parts = [
                Component::new(ComponentKind::Generator, "file", &generator),
                Component::new(ComponentKind::Transformer, "xslt", stage),
            ];
            let result = cache.fetch_or_compute(&parts, || 7).unwrap();
            assert_eq!(result, Lookup::Bypass(Arc::new(7)));
        }
        assert!(cache.store().is_empty());
    }

    #[test]
    fn empty_component_list_bypasses() {
        let cache = cache::<u8>();
        let result = cache.fetch_or_compute(&[], || 1).unwrap();
        assert!(matches!(result, Lookup::Bypass(_)));
        assert!(cache.into_inner().is_empty());
    }

    #[test]
    fn every_component_must_stay_valid() {
        let cache = cache();
        let generator = Stage::at(5);
        let serializer = Stage {
            key: Some(9),
            validity: Some(Validity::Always),
        };
        let parts = [
            Component::new(ComponentKind::Generator, "file", &generator),
            Component::new(ComponentKind::Serializer, "html", &serializer),
        ];
        cache.fetch_or_compute(&parts, || 1).unwrap();
        assert!(cache.fetch_or_compute(&parts, || 2).unwrap().is_hit());

        let stale_serializer = Stage {
            key: Some(9),
            validity: Some(Validity::timestamp(0)),
        };
        let parts = [
            Component::new(ComponentKind::Generator, "file", &generator),
            Component::new(ComponentKind::Serializer, "html", &stale_serializer),
        ];
        let result = cache.fetch_or_compute(&parts, || 3).unwrap();
        assert_eq!(**result.payload(), 3);
    }

    #[test]
    fn component_order_and_kind_distinguish_keys() {
        let cache = cache();
        let a = Stage::at(1);
        let b = Stage::at(1);
        let forward = [
            Component::new(ComponentKind::Generator, "a", &a),
            Component::new(ComponentKind::Transformer, "b", &b),
        ];
        let swapped = [
            Component::new(ComponentKind::Transformer, "b", &b),
            Component::new(ComponentKind::Generator, "a", &a),
        ];
        cache.fetch_or_compute(&forward, || 1).unwrap();
        assert!(!cache.fetch_or_compute(&swapped, || 2).unwrap().is_hit());
        assert_eq!(cache.store().size(), 2);
    }

    #[test]
    fn works_over_bounded_mru_store() {
        let store = MruStoreBuilder::new()
            .max_entries(1)
            .build::<CacheKey, CachedEntry<String, u32>>();
        let cache = ValidityCache::new(store);
        let first = Stage::at(1);
        let second = Stage {
            key: Some(2),
            validity: Some(Validity::timestamp(1)),
        };
        let one = [Component::new(ComponentKind::Generator, "file", &first)];
        let two = [Component::new(ComponentKind::Generator, "file", &second)];

        cache.fetch_or_compute(&one, || 1u32).unwrap();
        cache.fetch_or_compute(&two, || 2u32).unwrap();
        assert_eq!(cache.store().size(), 1);
        assert!(!cache.fetch_or_compute(&one, || 3u32).unwrap().is_hit());
    }
}
