pub mod bucket;
pub mod recency;
pub mod slot_arena;

pub use bucket::{
    BucketChain, BucketSelector, ChainEntry, DEFAULT_BUCKETS, MIN_BUCKETS, normalize_bucket_count,
};
pub use recency::{RecencyHandle, RecencyList};
pub use slot_arena::{SlotArena, SlotId};
