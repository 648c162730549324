//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::value_objects::ConfigWarning;
use crate::error::{WeaveError, WeaveResult};

use super::env_validator::{levenshtein, EnvVarValidator};
use super::types::Config;

/// Project configuration file, looked up in the project root
pub const CONFIG_FILE_NAME: &str = "weave.toml";

pub const ENV_OUTPUT: &str = "WEAVE_OUTPUT";
pub const ENV_STRICT: &str = "WEAVE_STRICT";
pub const ENV_MAX_DEPTH: &str = "WEAVE_MAX_DEPTH";

const BOOL_VALUES: &[&str] = &["true", "false", "1", "0", "yes", "no", "on", "off"];

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> WeaveResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path)?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| WeaveError::Config {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                key: key.clone(),
                file: path.to_path_buf(),
                line: find_line_number(&content, &key),
                suggestion: suggest_key(&key),
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Load `weave.toml` from `project_root` (or defaults), then apply `WEAVE_*`
/// overrides. A config file that exists but does not parse is an error.
pub fn load_or_default(project_root: &Path) -> WeaveResult<(Config, Vec<ConfigWarning>)> {
    let path = config_path(project_root);
    let (config, warnings) = if path.is_file() {
        debug!(path = %path.display(), "loading configuration");
        load_with_warnings(&path)?
    } else {
        (Config::default(), Vec::new())
    };
    Ok((with_env_overrides(config), warnings))
}

pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_FILE_NAME)
}

/// Apply environment variable overrides (WEAVE_* prefix)
pub fn with_env_overrides(config: Config) -> Config {
    apply_env(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary variable lookup.
pub(crate) fn apply_env<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(output) = lookup(ENV_OUTPUT).filter(|v| !v.trim().is_empty()) {
        config.output = PathBuf::from(output.trim());
    }

    if let Some(value) = lookup(ENV_STRICT) {
        config.compose.strict = EnvVarValidator::new(ENV_STRICT, BOOL_VALUES).parse(
            &value,
            parse_bool,
            config.compose.strict,
        );
    }

    if let Some(value) = lookup(ENV_MAX_DEPTH) {
        config.compose.max_depth = EnvVarValidator::new(ENV_MAX_DEPTH, &["a positive integer"])
            .parse(
                &value,
                |v| v.trim().parse::<usize>().ok().filter(|d| *d > 0),
                config.compose.max_depth,
            );
    }

    config
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    for (i, line) in content.lines().enumerate() {
        if line.contains(needle) {
            return Some(i + 1);
        }
    }
    None
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "source",
        "output",
        "cache_dir",
        "pretty_urls",
        "clean",
        "force",
        "compose",
        "max_depth",
        "strict",
        "classify",
        "ignore",
        "ignore_render",
        "ignore_copy",
        "render",
        "copy",
        "auto_ignore",
        "respect_gitignore",
        "case_sensitive",
        "assets_dir",
        "layout",
        "default_layout",
        "rules",
        "layout_filename",
        "includes_dir",
        "watch",
        "debounce_ms",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}
