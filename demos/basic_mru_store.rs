//! Example demonstrating the bounded MRU store and validity-checked lookups.
//!
//! Every successful read promotes an entry; when the store grows past its
//! bound, the least recently used entry is evicted.
//!
//! Run with: cargo run --example basic_mru_store

use mrucache::builder::MruStoreBuilder;
use mrucache::entry::CachedEntry;
use mrucache::key::{CacheKey, ComponentKind};
use mrucache::producer::{Cacheable, Component, ValidityCache};
use mrucache::store::traits::Store;
use mrucache::validity::Validity;

struct Document {
    path_hash: u64,
    mtime: i64,
}

impl Cacheable for Document {
    fn generate_key(&self) -> Option<u64> {
        Some(self.path_hash)
    }

    fn generate_validity(&self) -> Option<Validity> {
        Some(Validity::timestamp(self.mtime))
    }
}

fn main() {
    println!("=== Bounded MRU Store ===\n");

    let store = MruStoreBuilder::new().max_entries(3).build::<u32, String>();
    for i in 1..=3 {
        store.store(i, format!("value-{i}")).unwrap();
    }
    println!("Inserted keys 1-3, size={}", store.size());

    store.get(&1);
    println!("Read key 1 (promoted to most recently used)");
    println!("  recency: {:?}", store.map().keys_by_recency());

    store.store(4, "value-4".to_string()).unwrap();
    println!("\nInserted key 4");
    println!("  contains 2? {} (least recently used, evicted)", store.contains_key(&2));
    println!("  contains 1? {} (read recently, kept)", store.contains_key(&1));
    println!("  recency: {:?}", store.map().keys_by_recency());
    println!("  metrics: {:?}", store.metrics());

    println!("\n=== Validity-Checked Lookups ===\n");

    let cache = ValidityCache::new(
        MruStoreBuilder::new()
            .max_entries(64)
            .build::<CacheKey, CachedEntry<String, String>>(),
    );

    for mtime in [100, 100, 101] {
        let doc = Document {
            path_hash: 0xabcd,
            mtime,
        };
        let parts = [Component::new(ComponentKind::Generator, "file", &doc)];
        let lookup = cache
            .fetch_or_compute(&parts, || format!("<html>rendered at {mtime}</html>"))
            .unwrap();
        println!(
            "mtime={mtime}: hit={} payload={}",
            lookup.is_hit(),
            lookup.payload()
        );
    }
}
