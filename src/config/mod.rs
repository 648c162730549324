//! Configuration module for Weave
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (WEAVE_*)
//! 3. Project config (`weave.toml`)
//! 4. Built-in defaults (lowest priority)
//!
//! The resulting [`Config`] is passed explicitly to every entry point.

mod env_validator;
mod loader;
#[cfg(test)]
mod tests;
mod types;

pub use crate::domain::value_objects::ConfigWarning;

pub use loader::{config_path, CONFIG_FILE_NAME, ENV_MAX_DEPTH, ENV_OUTPUT, ENV_STRICT};
pub use types::{ClassifyConfig, ComposeConfig, Config, LayoutConfig, WatchConfig};
