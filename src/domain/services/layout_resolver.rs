//! Layout resolver
//!
//! Picks the layout wrapping a page. Precedence, first match wins:
//!
//! 1. explicit directive (frontmatter `layout:` or a `data-layout` attribute)
//! 2. default-layout pattern rules, last matching rule wins
//! 3. the single default layout filename
//! 4. directory discovery: the conventional layout file in the page's
//!    directory and each ancestor up to the source root, then the includes
//!    directory
//! 5. no layout
//!
//! Every evaluated step is recorded on the [`LayoutResolution`] so that
//! `weave build -vv` can explain why a layout was (or was not) chosen, along
//! with every candidate file that was looked for and missing. Resolution never
//! fails: problems become notes on the result.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::html;
use super::reference::{normalize_path, Lookup, ReferenceResolver, DEFAULT_INCLUDES_DIR};
use crate::domain::entities::LayoutDirective;
use crate::domain::ports::FileSystem;
use crate::domain::value_objects::{PatternError, PatternList, PatternMatch};
use crate::error::WeaveResult;
use crate::parser::read_frontmatter;

/// Default conventional layout filename looked up during discovery
pub const DEFAULT_LAYOUT_FILENAME: &str = "_layout.html";

/// Attribute carrying an in-document layout directive
pub const LAYOUT_ATTR: &str = "data-layout";

/// Which precedence step produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutSource {
    Explicit,
    Pattern,
    Filename,
    Discovery,
    None,
}

/// One evaluated step of the precedence chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionStep {
    pub step: LayoutSource,
    pub applied: bool,
    pub result: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutResolution {
    pub layout_path: Option<PathBuf>,
    pub source: LayoutSource,
    pub chain: Vec<ResolutionStep>,
    /// Candidate layout files probed and not found, in probe order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub probed: Vec<PathBuf>,
    /// Set when a failure degraded the resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LayoutResolution {
    fn new() -> Self {
        Self {
            layout_path: None,
            source: LayoutSource::None,
            chain: Vec::new(),
            probed: Vec::new(),
            error: None,
        }
    }

    fn skipped(&mut self, step: LayoutSource, note: impl Into<String>) {
        self.chain.push(ResolutionStep {
            step,
            applied: false,
            result: None,
            note: Some(note.into()),
        });
    }

    fn applied(mut self, step: LayoutSource, result: Option<PathBuf>) -> Self {
        self.chain.push(ResolutionStep {
            step,
            applied: true,
            result: result.clone(),
            note: None,
        });
        self.layout_path = result;
        self.source = step;
        self
    }
}

/// `pattern → layout` default rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRule {
    pub pattern: String,
    pub layout: String,
}

impl LayoutRule {
    pub fn new(pattern: impl Into<String>, layout: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            layout: layout.into(),
        }
    }

    /// Parse the `pattern=layout` config form.
    pub fn parse(spec: &str) -> Result<Self, PatternError> {
        let (pattern, layout) = spec.rsplit_once('=').ok_or_else(|| PatternError::Invalid {
            pattern: spec.to_string(),
            message: "expected 'pattern=layout'".to_string(),
        })?;
        let (pattern, layout) = (pattern.trim(), layout.trim());
        if pattern.is_empty() || layout.is_empty() {
            return Err(PatternError::Invalid {
                pattern: spec.to_string(),
                message: "expected 'pattern=layout'".to_string(),
            });
        }
        Ok(Self::new(pattern, layout))
    }
}

#[derive(Debug, Clone)]
pub struct LayoutOptions {
    pub default_layout: Option<String>,
    pub layout_filename: String,
    pub includes_dir: String,
    pub case_sensitive: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            default_layout: None,
            layout_filename: DEFAULT_LAYOUT_FILENAME.to_string(),
            includes_dir: DEFAULT_INCLUDES_DIR.to_string(),
            case_sensitive: true,
        }
    }
}

type DiscoveryKey = (PathBuf, PathBuf);

pub struct LayoutResolver {
    fs: Arc<dyn FileSystem>,
    options: LayoutOptions,
    rule_patterns: PatternList,
    rules: Vec<LayoutRule>,
    discovery_cache: Mutex<HashMap<DiscoveryKey, Lookup>>,
}

impl LayoutResolver {
    pub fn new(fs: Arc<dyn FileSystem>, options: LayoutOptions) -> Self {
        let case_sensitive = options.case_sensitive;
        Self {
            fs,
            options,
            rule_patterns: PatternList::new(case_sensitive),
            rules: Vec::new(),
            discovery_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Register a default-layout rule after all existing ones.
    pub fn add_rule(&mut self, rule: LayoutRule) -> Result<(), PatternError> {
        self.rule_patterns.add(&rule.pattern)?;
        self.rules.push(rule);
        Ok(())
    }

    pub fn with_rule(mut self, rule: LayoutRule) -> Result<Self, PatternError> {
        self.add_rule(rule)?;
        Ok(self)
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn file_system(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Resolve the layout for `file` whose raw text is `content`.
    pub fn resolve_layout(&self, file: &Path, content: &str, source_root: &Path) -> LayoutResolution {
        let file = normalize_path(file);
        let mut resolution = LayoutResolution::new();

        // 1. Explicit directive
        match explicit_directive(&file, content) {
            Ok(Some(LayoutDirective::Disabled)) => {
                return resolution.applied(LayoutSource::Explicit, None);
            }
            Ok(Some(LayoutDirective::Named(name))) => {
                let lookup = self.lookup_name(&name, &file, source_root);
                resolution.probed.extend(lookup.missed);
                match lookup.found {
                    Some(path) => return resolution.applied(LayoutSource::Explicit, Some(path)),
                    None => resolution.skipped(
                        LayoutSource::Explicit,
                        format!("layout '{}' not found", name),
                    ),
                }
            }
            Ok(None) => resolution.skipped(LayoutSource::Explicit, "no layout directive"),
            Err(e) => {
                resolution.skipped(LayoutSource::Explicit, "directive unreadable");
                resolution.error = Some(e.to_string());
            }
        }

        // 2. Pattern rules
        if !self.rules.is_empty() {
            let rel = file.strip_prefix(normalize_path(source_root)).unwrap_or(file.as_path());
            match self.rule_patterns.matches(rel) {
                PatternMatch::Matched(pattern) => {
                    let rule = self
                        .rules
                        .iter()
                        .rev()
                        .find(|r| r.pattern.trim() == pattern);
                    if let Some(rule) = rule {
                        let lookup = self.lookup_name(&rule.layout, &file, source_root);
                        resolution.probed.extend(lookup.missed);
                        match lookup.found {
                            Some(path) => {
                                return resolution.applied(LayoutSource::Pattern, Some(path))
                            }
                            None => resolution.skipped(
                                LayoutSource::Pattern,
                                format!("rule '{}' layout '{}' not found", pattern, rule.layout),
                            ),
                        }
                    }
                }
                PatternMatch::Negated(pattern) => resolution.skipped(
                    LayoutSource::Pattern,
                    format!("excluded by '{}'", pattern),
                ),
                PatternMatch::None => {
                    resolution.skipped(LayoutSource::Pattern, "no matching rule")
                }
            }
        }

        // 3. Default layout filename
        if let Some(name) = &self.options.default_layout {
            let lookup = self.lookup_name(name, &file, source_root);
            resolution.probed.extend(lookup.missed);
            match lookup.found {
                Some(path) if path != file => {
                    return resolution.applied(LayoutSource::Filename, Some(path))
                }
                _ => resolution.skipped(
                    LayoutSource::Filename,
                    format!("default layout '{}' not found", name),
                ),
            }
        }

        // 4. Directory discovery
        let lookup = self.discovery(&file, source_root);
        resolution.probed.extend(lookup.missed);
        match lookup.found.filter(|layout| *layout != file) {
            Some(path) => return resolution.applied(LayoutSource::Discovery, Some(path)),
            None => resolution.skipped(LayoutSource::Discovery, "no layout file found"),
        }

        // 5. No layout
        resolution.applied(LayoutSource::None, None)
    }

    /// Resolve a layout name or path as seen from `from_file`.
    pub fn resolve_name(
        &self,
        name: &str,
        from_file: &Path,
        source_root: &Path,
    ) -> Result<PathBuf, Vec<PathBuf>> {
        self.lookup_name(name, from_file, source_root).into_result()
    }

    /// Like [`resolve_name`](Self::resolve_name), keeping the missed candidates.
    pub fn lookup_name(&self, name: &str, from_file: &Path, source_root: &Path) -> Lookup {
        ReferenceResolver::new(self.fs.as_ref(), source_root, &self.options.includes_dir)
            .lookup(name, from_file)
    }

    /// Directory-based discovery, cached per (directory, source root).
    pub fn discover(&self, file: &Path, source_root: &Path) -> Option<PathBuf> {
        let file = normalize_path(file);
        self.discovery(&file, source_root)
            .found
            .filter(|layout| *layout != file)
    }

    fn discovery(&self, file: &Path, source_root: &Path) -> Lookup {
        let dir = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| source_root.to_path_buf());
        let key = (dir.clone(), normalize_path(source_root));

        let cached = self
            .discovery_cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .cloned();
        if let Some(found) = cached {
            return found;
        }
        let found = self.walk_for_layout(&dir, source_root);
        self.discovery_cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, found.clone());
        found
    }

    fn walk_for_layout(&self, dir: &Path, source_root: &Path) -> Lookup {
        let resolver =
            ReferenceResolver::new(self.fs.as_ref(), source_root, &self.options.includes_dir);
        let filename = &self.options.layout_filename;
        let includes = resolver.includes_path();
        let bare = filename.trim_start_matches('_');

        let mut candidates: Vec<PathBuf> = resolver
            .ancestor_dirs(dir)
            .into_iter()
            .map(|ancestor| ancestor.join(filename))
            .collect();
        candidates.push(includes.join(filename));
        if bare != filename.as_str() {
            candidates.push(includes.join(bare));
        }
        Lookup::probe(self.fs.as_ref(), candidates)
    }

    /// Forget cached discovery walks (layouts were added or removed).
    pub fn clear_cache(&self) {
        self.discovery_cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn cached_discoveries(&self) -> usize {
        self.discovery_cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

/// Layout directive of a document: frontmatter first, then the first element
/// carrying `data-layout`.
pub fn explicit_directive(file: &Path, content: &str) -> WeaveResult<Option<LayoutDirective>> {
    let (frontmatter, body) = read_frontmatter(content, file)?;
    if let Some(directive) = frontmatter.as_ref().and_then(|f| f.layout_directive()) {
        return Ok(Some(directive));
    }
    Ok(html::find_element(body, |e| e.has_attr(LAYOUT_ATTR))
        .and_then(|e| e.attr(LAYOUT_ATTR).map(LayoutDirective::parse)))
}
