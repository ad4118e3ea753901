//! Stores: the concurrent MRU map and the [`Store`](traits::Store) facades
//! built on top of it.

pub mod bounded;
mod counters;
pub mod memory;
pub mod mru;
pub mod traits;

pub use bounded::{DEFAULT_FREE_RATIO, MruMemoryStore};
pub use memory::MemoryStore;
pub use mru::MruBucketMap;
pub use traits::{Store, StoreMetrics};
