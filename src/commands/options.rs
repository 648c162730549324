use std::path::Path;

use anyhow::{Context, Result};
use weave::application::BuildOptions;
use weave::config::{config_path, Config, ConfigWarning};

use crate::cli::SiteArgs;

/// Load `weave.toml`, apply `WEAVE_*` variables, then the command-line
/// flags. Unknown config keys are reported on stderr.
pub fn load_build_options(root: &Path, site: &SiteArgs) -> Result<BuildOptions> {
    let (config, warnings) = Config::load_or_default(root)
        .with_context(|| format!("failed to load {}", config_path(root).display()))?;
    print_config_warnings(&warnings);

    let mut config = config.with_env_overrides();
    if let Some(source) = &site.source {
        config.source = source.clone();
    }
    if let Some(output) = &site.output {
        config.output = output.clone();
    }
    if site.strict {
        config.compose.strict = true;
    }
    if site.pretty_urls {
        config.pretty_urls = true;
    }
    Ok(BuildOptions::new(root, config))
}

pub fn print_config_warnings(warnings: &[ConfigWarning]) {
    for w in warnings {
        eprintln!("⚠ {}", w);
    }
}
