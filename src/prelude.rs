pub use crate::builder::MruStoreBuilder;
pub use crate::entry::{CachedEntry, CachedEntryBuilder};
pub use crate::error::{ConfigError, InvariantError, StoreError};
pub use crate::key::{CacheKey, ComponentKey, ComponentKind, KeyPart};
pub use crate::producer::{Cacheable, Component, Lookup, ValidityCache};
pub use crate::store::bounded::MruMemoryStore;
pub use crate::store::memory::MemoryStore;
pub use crate::store::mru::MruBucketMap;
pub use crate::store::traits::{Store, StoreMetrics};
pub use crate::validity::Validity;
