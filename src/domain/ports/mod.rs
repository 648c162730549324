//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod cache_store;
pub mod file_system;
pub mod markdown;

pub use cache_store::{CacheSnapshot, CacheStore, CacheStoreError, CacheStoreResult};
pub use file_system::{FileSystem, FsError, FsResult};
pub use markdown::MarkdownRenderer;
