//! Build Options

use std::path::{Path, PathBuf};

use crate::config::Config;

/// Options for the build use case
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Directory relative config paths are resolved against
    pub project_root: PathBuf,
    pub config: Config,
}

impl BuildOptions {
    pub fn new(project_root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            project_root: project_root.into(),
            config,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.config.force = force;
        self
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.config.clean = clean;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.config.compose.strict = strict;
        self
    }

    pub fn source_dir(&self) -> PathBuf {
        self.config.source_dir(&self.project_root)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config.output_dir(&self.project_root)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.config.cache_path(&self.project_root)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}
