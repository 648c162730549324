//! Source tree scanning
//!
//! Walks the source directory, works out which files act as layouts or
//! fragments, and sets up the classifier for one pass.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, warn};

use crate::config::Config;
use crate::domain::entities::LayoutDirective;
use crate::domain::ports::FileSystem;
use crate::domain::services::html;
use crate::domain::services::layout_resolver::explicit_directive;
use crate::domain::services::{
    normalize_path, FileClassifier, LayoutResolver, ReferenceResolver, IMPORT_ATTR, LAYOUT_ATTR,
};
use crate::domain::value_objects::{IgnorePatterns, PatternError, IGNORE_FILE_NAME};
use crate::parser::split_frontmatter;

/// Every regular file under `source_root`, sorted, skipping `excluded`
/// directories and `.git`.
pub(crate) fn scan_sources(source_root: &Path, excluded: &[PathBuf]) -> Vec<PathBuf> {
    let excluded: Vec<PathBuf> = excluded.iter().map(|p| normalize_path(p)).collect();

    let mut walker = WalkBuilder::new(source_root);
    walker
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            let path = normalize_path(entry.path());
            entry.file_name() != ".git" && !excluded.iter().any(|x| path.starts_with(x))
        });

    let mut files = Vec::new();
    for entry in walker.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("walker error: {}", e);
                continue;
            }
        };
        if entry.file_type().is_some_and(|t| t.is_file()) {
            files.push(normalize_path(entry.path()));
        }
    }
    files.sort();
    debug!(count = files.len(), root = %source_root.display(), "scanned sources");
    files
}

/// Files used as layouts or import targets by any of `renderables`,
/// followed through layouts that name further layouts or imports.
pub(crate) fn template_files(
    fs: &dyn FileSystem,
    layouts: &LayoutResolver,
    source_root: &Path,
    renderables: &[PathBuf],
) -> BTreeSet<PathBuf> {
    let references =
        ReferenceResolver::new(fs, source_root, &layouts.options().includes_dir);
    let mut templates = BTreeSet::new();
    let mut queue: Vec<(PathBuf, bool)> = renderables.iter().map(|p| (p.clone(), true)).collect();

    while let Some((file, is_page)) = queue.pop() {
        let Ok(text) = fs.read(&file) else {
            continue;
        };
        let mut found = Vec::new();

        if is_page {
            // Pages also pick up rule, default and discovered layouts.
            if let Some(layout) = layouts.resolve_layout(&file, &text, source_root).layout_path {
                found.push(layout);
            }
        } else if let Ok(Some(LayoutDirective::Named(name))) = explicit_directive(&file, &text) {
            if let Ok(layout) = layouts.resolve_name(&name, &file, source_root) {
                found.push(layout);
            }
        }

        for element in html::parse_elements(split_frontmatter(&text).body) {
            if let Some(reference) = element.attr(IMPORT_ATTR) {
                if let Ok(target) = references.resolve(reference, &file) {
                    found.push(target);
                }
            }
            if !is_page {
                if let Some(name) = element.attr(LAYOUT_ATTR) {
                    if let Ok(target) = references.resolve(name, &file) {
                        found.push(target);
                    }
                }
            }
        }

        for template in found {
            if template != file && templates.insert(template.clone()) {
                queue.push((template, false));
            }
        }
    }
    templates
}

/// Whether a path looks like a layout or fragment by name alone.
pub(crate) fn is_template_name(rel: &Path, config: &Config) -> bool {
    let includes = Path::new(config.layout.includes_dir.trim_matches('/'));
    if !includes.as_os_str().is_empty() && rel.starts_with(includes) {
        return true;
    }
    if rel
        .file_name()
        .is_some_and(|n| n == config.layout.layout_filename.as_str())
    {
        return true;
    }
    rel.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|s| s.starts_with('_'))
    })
}

type Register = fn(&mut FileClassifier, &str) -> Result<(), PatternError>;

/// Classifier for one pass: configured patterns, the project ignore file
/// and the discovered templates. Registration problems become warnings.
pub(crate) fn build_classifier(
    config: &Config,
    source_root: &Path,
    templates: &BTreeSet<PathBuf>,
    warnings: &mut Vec<String>,
) -> FileClassifier {
    let mut classifier = FileClassifier::new(config.classifier_options());
    let classify = &config.classify;

    let lists: [(&str, &Vec<String>, Register); 5] = [
        ("ignore", &classify.ignore, FileClassifier::add_ignore_pattern),
        (
            "ignore_render",
            &classify.ignore_render,
            FileClassifier::add_render_ignore_pattern,
        ),
        (
            "ignore_copy",
            &classify.ignore_copy,
            FileClassifier::add_copy_ignore_pattern,
        ),
        ("render", &classify.render, FileClassifier::add_render_pattern),
        ("copy", &classify.copy, FileClassifier::add_copy_pattern),
    ];
    for (name, patterns, register) in lists {
        for pattern in patterns {
            if let Err(e) = register(&mut classifier, pattern) {
                warn!(list = name, error = %e, "skipping invalid pattern");
                warnings.push(format!("classify.{}: {}", name, e));
            }
        }
    }

    if classify.respect_gitignore {
        match IgnorePatterns::load(source_root) {
            Ok(patterns) => {
                warnings.extend(patterns.rejected().iter().map(|r| {
                    format!("{}:{}: {}", IGNORE_FILE_NAME, r.line, r.message)
                }));
                classifier.set_project_ignore(patterns);
            }
            Err(e) => {
                warn!(error = %e, "ignoring unreadable project ignore file");
                warnings.push(e.to_string());
            }
        }
    }

    for template in templates {
        if let Ok(rel) = template.strip_prefix(source_root) {
            classifier.add_auto_ignored(rel);
        }
    }

    warnings.extend(classifier.warnings().iter().map(|w| w.to_string()));
    classifier
}

/// Output location for an input at `rel`.
///
/// Pages map to `.html` (`a/b.md` → `a/b.html`); with `pretty_urls` a
/// non-index page becomes `a/b/index.html`. Copied files keep their path.
pub fn output_path(rel: &Path, output_root: &Path, is_page: bool, pretty_urls: bool) -> PathBuf {
    if !is_page {
        return output_root.join(rel);
    }
    let html = rel.with_extension("html");
    let is_index = html.file_stem().is_some_and(|s| s == "index");
    if pretty_urls && !is_index {
        let dir = html.with_extension("");
        return output_root.join(dir).join("index.html");
    }
    output_root.join(html)
}
