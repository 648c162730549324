//! Change impact analysis
//!
//! Maps a changed file to the pages that must be rebuilt. The recorded
//! dependency graph is authoritative; for files the graph has never seen
//! (a fragment created after the last build, an asset nobody composed yet)
//! the analyzer falls back to scanning nearby sources for references.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::composer::IMPORT_ATTR;
use super::html;
use super::layout_resolver::{explicit_directive, LAYOUT_ATTR};
use super::reference::{local_target, normalize_path, ReferenceResolver};
use crate::domain::entities::{DependencyGraph, LayoutDirective};
use crate::domain::ports::FileSystem;
use crate::parser::split_frontmatter;

const SCANNED_EXTENSIONS: &[&str] = &["html", "htm", "md", "markdown"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

impl ImpactLevel {
    /// 0-1 dependents: low, 2-10: medium, more: high.
    pub fn from_count(count: usize) -> Self {
        match count {
            0..=1 => ImpactLevel::Low,
            2..=10 => ImpactLevel::Medium,
            _ => ImpactLevel::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeImpact {
    pub path: PathBuf,
    pub dependent_pages: Vec<PathBuf>,
    pub impact_level: ImpactLevel,
    /// Dependents came from a textual scan rather than the graph
    pub fallback_used: bool,
}

pub struct ChangeImpactAnalyzer<'a> {
    fs: &'a dyn FileSystem,
    source_root: &'a Path,
    includes_dir: &'a str,
}

impl<'a> ChangeImpactAnalyzer<'a> {
    pub fn new(fs: &'a dyn FileSystem, source_root: &'a Path, includes_dir: &'a str) -> Self {
        Self {
            fs,
            source_root,
            includes_dir,
        }
    }

    pub fn get_change_impact(&self, path: &Path, graph: &DependencyGraph) -> ChangeImpact {
        let path = normalize_path(path);

        let (dependents, fallback_used) = if graph.is_known(&path) {
            (graph.transitive_dependents(&path), false)
        } else {
            let mut found = BTreeSet::new();
            for referrer in self.scan_referrers(&path) {
                found.extend(graph.transitive_dependents(&referrer));
                found.insert(referrer);
            }
            found.remove(&path);
            (found, true)
        };

        ChangeImpact {
            impact_level: ImpactLevel::from_count(dependents.len()),
            dependent_pages: dependents.into_iter().collect(),
            path,
            fallback_used,
        }
    }

    /// Sources in the changed file's directory and its ancestors that
    /// reference it.
    fn scan_referrers(&self, changed: &Path) -> BTreeSet<PathBuf> {
        let resolver = ReferenceResolver::new(self.fs, self.source_root, self.includes_dir);
        let start = changed.parent().unwrap_or(self.source_root);

        let mut referrers = BTreeSet::new();
        for dir in resolver.ancestor_dirs(start) {
            let Ok(entries) = self.fs.list_dir(&dir) else {
                continue;
            };
            for file in entries {
                if file == changed || !is_scanned(&file) || !self.fs.is_file(&file) {
                    continue;
                }
                let Ok(text) = self.fs.read(&file) else {
                    continue;
                };
                if self
                    .references_in(&resolver, &file, &text)
                    .iter()
                    .any(|target| target == changed)
                {
                    referrers.insert(file);
                }
            }
        }
        referrers
    }

    /// Every path `file` points at through directives, `href`/`src`
    /// attributes or CSS `url()`.
    fn references_in(
        &self,
        resolver: &ReferenceResolver<'_>,
        file: &Path,
        text: &str,
    ) -> Vec<PathBuf> {
        let root = normalize_path(self.source_root);
        let dir = file.parent().unwrap_or(self.source_root);
        let body = split_frontmatter(text).body;
        let mut out = Vec::new();

        // Directive references can name files that do not exist yet, so take
        // every candidate rather than only the first hit.
        if let Ok(Some(LayoutDirective::Named(name))) = explicit_directive(file, text) {
            out.extend(resolver.candidates(&name, file));
        }
        for element in html::parse_elements(body) {
            for attr in [IMPORT_ATTR, LAYOUT_ATTR] {
                if let Some(reference) = element.attr(attr) {
                    out.extend(resolver.candidates(reference, file));
                }
            }
            for attr in ["href", "src"] {
                if let Some(target) = element.attr(attr).and_then(|v| local_target(v, &root, dir)) {
                    out.push(target);
                }
            }
        }
        for value in css_urls(body) {
            if let Some(target) = local_target(value, &root, dir) {
                out.push(target);
            }
        }
        out
    }
}

fn is_scanned(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SCANNED_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

/// Values of `url(...)` in inline styles and `<style>` blocks.
fn css_urls(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(idx) = rest.find("url(") {
        rest = &rest[idx + 4..];
        let Some(end) = rest.find(')') else {
            break;
        };
        let value = rest[..end].trim().trim_matches(|c| c == '"' || c == '\'');
        if !value.is_empty() {
            out.push(value);
        }
        rest = &rest[end + 1..];
    }
    out
}
