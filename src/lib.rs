//! mrucache: a concurrent most-recently-used store with validity-checked
//! artifact caching.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod builder;
pub mod ds;
pub mod entry;
pub mod error;
pub mod key;
pub mod prelude;
pub mod producer;
pub mod store;
pub mod validity;
