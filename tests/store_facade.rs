// ==============================================
// STORE FACADE TESTS (integration)
// ==============================================
//
// Both Store implementations driven through the trait only. Apart from
// eviction, callers must not be able to tell them apart.

use std::sync::{Arc, Barrier};
use std::thread;

use mrucache::builder::MruStoreBuilder;
use mrucache::entry::CachedEntry;
use mrucache::key::{CacheKey, ComponentKind};
use mrucache::producer::{Cacheable, Component, Lookup, ValidityCache};
use mrucache::store::bounded::MruMemoryStore;
use mrucache::store::memory::MemoryStore;
use mrucache::store::traits::Store;
use mrucache::validity::Validity;

fn exercise_contract<S: Store<String, u32>>(store: &S) {
    assert!(store.is_empty());
    assert_eq!(store.get(&"missing".to_string()), None);

    store.store("a".to_string(), 1).unwrap();
    store.hold("b".to_string(), 2).unwrap();
    store.store("a".to_string(), 10).unwrap();

    assert_eq!(store.size(), 2);
    assert_eq!(store.get(&"a".to_string()).as_deref(), Some(&10));
    assert!(store.contains_key(&"b".to_string()));

    let mut keys: Vec<_> = store.keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

    assert_eq!(store.remove(&"b".to_string()).as_deref(), Some(&2));
    assert_eq!(store.remove(&"b".to_string()), None);

    store.clear();
    assert_eq!(store.size(), 0);
    assert_eq!(store.keys().count(), 0);

    let metrics = store.metrics();
    assert_eq!(metrics.hits, 1);
    assert_eq!(metrics.misses, 1);
    assert_eq!(metrics.inserts, 2);
    assert_eq!(metrics.updates, 1);
    assert_eq!(metrics.removes, 1);
}

mod contract {
    use super::*;

    #[test]
    fn memory_store_satisfies_contract() {
        exercise_contract(&MemoryStore::<String, u32>::new());
    }

    #[test]
    fn mru_store_satisfies_contract() {
        let store: MruMemoryStore<String, u32> = MruStoreBuilder::new().build();
        exercise_contract(&store);
    }

    #[test]
    fn bounded_mru_store_satisfies_contract_within_bound() {
        let store: MruMemoryStore<String, u32> = MruStoreBuilder::new().max_entries(8).build();
        exercise_contract(&store);
    }

    #[test]
    fn stores_are_usable_as_trait_objects() {
        let stores: Vec<Box<dyn Store<u32, u32>>> = vec![
            Box::new(MemoryStore::<u32, u32>::new()),
            Box::new(MruStoreBuilder::new().max_entries(100).build::<u32, u32>()),
        ];
        for store in &stores {
            for i in 0..50 {
                store.store(i, i + 1).unwrap();
            }
            assert_eq!(store.size(), 50);
            assert_eq!(store.get(&7).as_deref(), Some(&8));
        }
    }
}

// ==============================================
// Eviction Differences
// ==============================================

mod eviction {
    use super::*;

    #[test]
    fn only_the_mru_store_frees_entries() {
        let memory = MemoryStore::new();
        let mru: MruMemoryStore<u32, u32> = MruStoreBuilder::new().free_ratio(0.5).build();
        for i in 0..20 {
            memory.store(i, i).unwrap();
            mru.store(i, i).unwrap();
        }
        memory.free();
        mru.free();

        assert_eq!(memory.size(), 20);
        assert_eq!(mru.size(), 10);
        // The oldest half went.
        assert!(!mru.contains_key(&0));
        assert!(mru.contains_key(&19));
        assert_eq!(mru.metrics().evictions, 10);
    }

    #[test]
    fn concurrent_writers_respect_bound() {
        let store: Arc<MruMemoryStore<u64, u64>> =
            Arc::new(MruStoreBuilder::new().max_entries(256).build());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..2_000 {
                        store.store(t * 10_000 + i, i).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Writers racing on the bound may each evict, so it can undershoot.
        assert!(store.size() <= 256);
        assert!(!store.is_empty());
        store.map().check_invariants().unwrap();
    }
}

// ==============================================
// Validity-Checked Lookups
// ==============================================

mod validity_cache {
    use super::*;

    struct FileSource {
        path_hash: u64,
        mtime: i64,
    }

    impl Cacheable for FileSource {
        fn generate_key(&self) -> Option<u64> {
            Some(self.path_hash)
        }

        fn generate_validity(&self) -> Option<Validity> {
            Some(Validity::timestamp(self.mtime))
        }
    }

    struct Stylesheet;

    impl Cacheable for Stylesheet {
        fn generate_key(&self) -> Option<u64> {
            Some(1)
        }

        fn generate_validity(&self) -> Option<Validity> {
            Some(Validity::Always)
        }
    }

    fn run<S>(cache: &ValidityCache<S, String>, mtime: i64) -> Lookup<String>
    where
        S: Store<CacheKey, CachedEntry<String, String>>,
    {
        let source = FileSource {
            path_hash: 0xfeed,
            mtime,
        };
        let parts = [
            Component::new(ComponentKind::Generator, "file", &source),
            Component::new(ComponentKind::Transformer, "xslt", &Stylesheet),
        ];
        cache
            .fetch_or_compute(&parts, || format!("page@{mtime}"))
            .unwrap()
    }

    #[test]
    fn pipeline_reuses_until_source_changes() {
        let cache = ValidityCache::new(
            MruStoreBuilder::new()
                .max_entries(16)
                .build::<CacheKey, CachedEntry<String, String>>(),
        );

        assert!(matches!(run(&cache, 1), Lookup::Miss(_)));
        assert!(run(&cache, 1).is_hit());
        let changed = run(&cache, 2);
        assert!(!changed.is_hit());
        assert_eq!(changed.payload().as_str(), "page@2");
        assert!(run(&cache, 2).is_hit());
        assert_eq!(cache.store().size(), 1);
    }

    #[test]
    fn both_backends_give_the_same_answers() {
        let memory =
            ValidityCache::new(MemoryStore::<CacheKey, CachedEntry<String, String>>::new());
        let mru = ValidityCache::new(
            MruStoreBuilder::new().build::<CacheKey, CachedEntry<String, String>>(),
        );
        for mtime in [1, 1, 2, 2, 1] {
            assert_eq!(run(&memory, mtime), run(&mru, mtime));
        }
    }
}
