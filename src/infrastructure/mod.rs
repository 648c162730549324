//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `fs/` - Local file system and atomic writes
//! - `markdown` - CommonMark rendering via pulldown-cmark
//! - `repositories/` - Build cache persistence

pub mod fs;
pub mod markdown;
pub mod repositories;

pub use fs::{atomic_write, LocalFs};
pub use markdown::PulldownRenderer;
pub use repositories::JsonCacheStore;
