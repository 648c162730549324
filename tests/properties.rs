//! Property tests for Weave.
//!
//! Properties use randomized input generation to explore edge cases and
//! protect invariants like "never panics" and "idempotent merge".
//!
//! Run with: `cargo test --test properties`

#[path = "properties/classifier.rs"]
mod classifier;

#[path = "properties/frontmatter.rs"]
mod frontmatter;

#[path = "properties/head.rs"]
mod head;

#[path = "properties/html.rs"]
mod html;
