//! Tests for the config module

use super::loader::{apply_env, load_or_default, load_with_warnings};
use super::types::*;
use super::{ENV_MAX_DEPTH, ENV_OUTPUT, ENV_STRICT};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.source, PathBuf::from("src"));
    assert_eq!(config.output, PathBuf::from("dist"));
    assert_eq!(config.cache_dir, PathBuf::from(".weave-cache"));
    assert_eq!(config.compose.max_depth, 10);
    assert!(!config.compose.strict);
    assert!(config.classify.auto_ignore);
    assert!(config.classify.respect_gitignore);
    assert_eq!(config.layout.layout_filename, "_layout.html");
    assert_eq!(config.layout.includes_dir, "_includes");
    assert_eq!(config.watch.debounce_ms, 100);
}

#[test]
fn test_config_parse_toml() {
    let toml = r#"
source = "site"
output = "public"
pretty_urls = true

[compose]
max_depth = 4
strict = true

[classify]
ignore = ["drafts/**"]
copy = ["static/**", "!static/tmp/**"]
auto_ignore = false

[layout]
default_layout = "base.html"
rules = ["blog/**=post", "docs/**=docs.html"]

[watch]
debounce_ms = 250
"#;

    let config: Config = toml::from_str(toml).unwrap();

    assert_eq!(config.source, PathBuf::from("site"));
    assert!(config.pretty_urls);
    assert_eq!(config.compose.max_depth, 4);
    assert!(config.compose.strict);
    assert_eq!(config.classify.copy.len(), 2);
    assert!(!config.classify.auto_ignore);
    assert_eq!(config.layout.default_layout.as_deref(), Some("base.html"));
    assert_eq!(config.watch.debounce_ms, 250);

    let rules = config.layout_rules().unwrap();
    assert_eq!(rules[0].pattern, "blog/**");
    assert_eq!(rules[1].layout, "docs.html");
}

#[test]
fn test_options_follow_config() {
    let mut config = Config::default();
    config.compose.strict = true;
    config.compose.max_depth = 3;
    config.classify.case_sensitive = false;

    let compose = config.compose_options();
    assert!(compose.strict);
    assert_eq!(compose.max_depth, 3);
    assert!(compose.synthesize_boilerplate);

    assert!(!config.classifier_options().case_sensitive);
    assert!(!config.layout_options().case_sensitive);
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut config = Config::default();
    config.compose.max_depth = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.layout.rules = vec!["no-separator".to_string()];
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("no-separator"), "{}", err);
}

#[test]
fn test_unknown_keys_warn_with_suggestion() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weave.toml");
    fs::write(&path, "outptu = \"x\"\n\n[compose]\nmax_dpth = 3\n").unwrap();

    let (config, warnings) = load_with_warnings(&path).unwrap();
    assert_eq!(config.output, PathBuf::from("dist"));
    assert_eq!(warnings.len(), 2);

    let outptu = warnings.iter().find(|w| w.key == "outptu").unwrap();
    assert_eq!(outptu.suggestion.as_deref(), Some("output"));
    assert_eq!(outptu.line, Some(1));

    let depth = warnings.iter().find(|w| w.key == "max_dpth").unwrap();
    assert_eq!(depth.suggestion.as_deref(), Some("max_depth"));
    assert_eq!(depth.line, Some(4));
}

#[test]
fn test_invalid_toml_is_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weave.toml");
    fs::write(&path, "[compose\nmax_depth = ").unwrap();

    let err = load_with_warnings(&path).unwrap_err();
    assert!(matches!(err, crate::error::WeaveError::Config { .. }));
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let (config, warnings) = load_or_default(dir.path()).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(config.source_dir(dir.path()), dir.path().join("src"));
    assert_eq!(config.output_dir(Path::new("/p")), PathBuf::from("/p/dist"));
}

#[test]
fn test_env_overrides() {
    let config = apply_env(
        Config::default(),
        env(&[
            (ENV_OUTPUT, "build"),
            (ENV_STRICT, "yes"),
            (ENV_MAX_DEPTH, "5"),
        ]),
    );

    assert_eq!(config.output, PathBuf::from("build"));
    assert!(config.compose.strict);
    assert_eq!(config.compose.max_depth, 5);
}

#[test]
fn test_invalid_env_values_keep_config() {
    let mut base = Config::default();
    base.compose.max_depth = 7;

    let config = apply_env(
        base,
        env(&[(ENV_STRICT, "sometimes"), (ENV_MAX_DEPTH, "0"), (ENV_OUTPUT, "  ")]),
    );

    assert!(!config.compose.strict);
    assert_eq!(config.compose.max_depth, 7);
    assert_eq!(config.output, PathBuf::from("dist"));
}

