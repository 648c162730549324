//! Configuration type definitions

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::services::{
    ClassifierOptions, ComposeOptions, LayoutOptions, LayoutRule, DEFAULT_INCLUDES_DIR,
    DEFAULT_LAYOUT_FILENAME, DEFAULT_MAX_DEPTH,
};
use crate::domain::value_objects::ConfigWarning;
use crate::error::{WeaveError, WeaveResult};

use super::loader;

/// Composition settings (`[compose]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Missing fragments fail the page
    #[serde(default)]
    pub strict: bool,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Classification settings (`[classify]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyConfig {
    #[serde(default)]
    pub ignore: Vec<String>,

    #[serde(default)]
    pub ignore_render: Vec<String>,

    #[serde(default)]
    pub ignore_copy: Vec<String>,

    #[serde(default)]
    pub render: Vec<String>,

    #[serde(default)]
    pub copy: Vec<String>,

    #[serde(default = "default_true")]
    pub auto_ignore: bool,

    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    #[serde(default = "default_true")]
    pub case_sensitive: bool,

    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            ignore: Vec::new(),
            ignore_render: Vec::new(),
            ignore_copy: Vec::new(),
            render: Vec::new(),
            copy: Vec::new(),
            auto_ignore: true,
            respect_gitignore: true,
            case_sensitive: true,
            assets_dir: default_assets_dir(),
        }
    }
}

fn default_assets_dir() -> String {
    "assets".to_string()
}

/// Layout settings (`[layout]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Layout filename used when no rule or explicit directive applies
    #[serde(default)]
    pub default_layout: Option<String>,

    /// Ordered `pattern=layout` entries; the last match wins
    #[serde(default)]
    pub rules: Vec<String>,

    #[serde(default = "default_layout_filename")]
    pub layout_filename: String,

    #[serde(default = "default_includes_dir")]
    pub includes_dir: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_layout: None,
            rules: Vec::new(),
            layout_filename: default_layout_filename(),
            includes_dir: default_includes_dir(),
        }
    }
}

fn default_layout_filename() -> String {
    DEFAULT_LAYOUT_FILENAME.to_string()
}

fn default_includes_dir() -> String {
    DEFAULT_INCLUDES_DIR.to_string()
}

/// Watch settings (`[watch]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

fn default_source() -> PathBuf {
    PathBuf::from("src")
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".weave-cache")
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_source")]
    pub source: PathBuf,

    #[serde(default = "default_output")]
    pub output: PathBuf,

    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Write `a/b.html` as `a/b/index.html`
    #[serde(default)]
    pub pretty_urls: bool,

    /// Remove the output directory and reset the cache before building
    #[serde(default)]
    pub clean: bool,

    /// Rebuild every page regardless of cache freshness
    #[serde(default)]
    pub force: bool,

    #[serde(default)]
    pub compose: ComposeConfig,

    #[serde(default)]
    pub classify: ClassifyConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
            cache_dir: default_cache_dir(),
            pretty_urls: false,
            clean: false,
            force: false,
            compose: ComposeConfig::default(),
            classify: ClassifyConfig::default(),
            layout: LayoutConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> WeaveResult<Self> {
        let (config, _warnings) = loader::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> WeaveResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Load `weave.toml` from the project root if present, then apply
    /// environment overrides.
    pub fn load_or_default(project_root: &Path) -> WeaveResult<(Self, Vec<ConfigWarning>)> {
        loader::load_or_default(project_root)
    }

    /// Apply environment variable overrides (WEAVE_* prefix)
    pub fn with_env_overrides(self) -> Self {
        loader::with_env_overrides(self)
    }

    /// Reject values no build could run with.
    pub fn validate(&self) -> WeaveResult<()> {
        if self.compose.max_depth == 0 {
            return Err(WeaveError::Validation {
                context: "compose.max_depth".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        self.layout_rules()?;
        Ok(())
    }

    /// Source directory, relative paths taken from `project_root`.
    pub fn source_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.source)
    }

    pub fn output_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.output)
    }

    pub fn cache_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.cache_dir)
    }

    pub fn compose_options(&self) -> ComposeOptions {
        ComposeOptions {
            max_depth: self.compose.max_depth,
            strict: self.compose.strict,
            ..ComposeOptions::default()
        }
    }

    pub fn classifier_options(&self) -> ClassifierOptions {
        ClassifierOptions {
            assets_dir: self.classify.assets_dir.clone(),
            auto_ignore: self.classify.auto_ignore,
            case_sensitive: self.classify.case_sensitive,
            ..ClassifierOptions::default()
        }
    }

    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            default_layout: self.layout.default_layout.clone(),
            layout_filename: self.layout.layout_filename.clone(),
            includes_dir: self.layout.includes_dir.clone(),
            case_sensitive: self.classify.case_sensitive,
        }
    }

    /// Parsed `[layout].rules`, in declaration order.
    pub fn layout_rules(&self) -> WeaveResult<Vec<LayoutRule>> {
        self.layout
            .rules
            .iter()
            .map(|spec| LayoutRule::parse(spec).map_err(WeaveError::from))
            .collect()
    }
}
