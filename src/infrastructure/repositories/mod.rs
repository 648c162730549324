//! Repository Implementations
//!
//! Concrete implementations of domain repository ports.

mod cache_store;

pub use cache_store::{JsonCacheStore, DEPENDENCIES_FILE, HASHES_FILE};
