//! In-process storage
//!
//! One store holding identities, refresh tokens, quota counters and rejection
//! sets. Every conditional update runs under a single write guard.

mod store;

pub use store::MemoryStore;
