//! File classifier
//!
//! Routes every source path to an action through three precedence tiers:
//!
//! 1. **Explicit** - user render overrides (and disabled auto-ignore) force
//!    renderable files to be emitted.
//! 2. **Ignore** - general, render-only and copy-only ignore patterns, rules
//!    derived from the project ignore file, and auto-ignored layout/fragment
//!    files.
//! 3. **Default** - renderable extensions emit, copy patterns (with an
//!    implicit lowest-precedence `assets/**`) and asset extensions copy,
//!    everything else is skipped.
//!
//! Within each pattern list the last matching pattern wins, negations
//! included.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::value_objects::{IgnorePatterns, PatternError, PatternList, PatternMatch};

pub const DEFAULT_RENDERABLE_EXTENSIONS: &[&str] = &["html", "htm", "md", "markdown"];

pub const DEFAULT_ASSET_EXTENSIONS: &[&str] = &[
    "css", "js", "mjs", "map", "json", "xml", "txt", "webmanifest", "png", "jpg", "jpeg", "gif",
    "svg", "webp", "avif", "ico", "bmp", "woff", "woff2", "ttf", "otf", "eot", "pdf", "mp3", "mp4",
    "webm", "ogg", "wav",
];

/// What the build does with a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileAction {
    /// Compose and write as a page
    Emit,
    /// Copy verbatim
    Copy,
    /// Not part of the output
    Skip,
    /// Excluded by an ignore rule
    Ignored,
}

/// Precedence tier that decided a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Explicit,
    Ignore,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub action: FileAction,
    pub tier: Tier,
    pub reason: String,
    pub matched_pattern: Option<String>,
}

impl ClassificationResult {
    fn new(action: FileAction, tier: Tier, reason: impl Into<String>) -> Self {
        Self {
            action,
            tier,
            reason: reason.into(),
            matched_pattern: None,
        }
    }

    fn with_pattern(mut self, pattern: &str) -> Self {
        self.matched_pattern = Some(pattern.to_string());
        self
    }
}

/// Non-fatal problems noticed while registering patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierWarning {
    /// The same pattern was registered both to copy and to ignore-copy
    CopyIgnoreConflict { pattern: String },
}

impl fmt::Display for ClassifierWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CopyIgnoreConflict { pattern } => write!(
                f,
                "pattern '{}' is registered both as copy and ignore-copy; the later registration decides",
                pattern
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierOptions {
    pub renderable_extensions: Vec<String>,
    pub asset_extensions: Vec<String>,
    /// Directory copied wholesale at the lowest precedence
    pub assets_dir: String,
    /// Treat `_`-prefixed renderables and registered layouts/fragments as ignored
    pub auto_ignore: bool,
    pub case_sensitive: bool,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            renderable_extensions: DEFAULT_RENDERABLE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            asset_extensions: DEFAULT_ASSET_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            assets_dir: "assets".to_string(),
            auto_ignore: true,
            case_sensitive: true,
        }
    }
}

/// Pure path → action classifier.
#[derive(Debug)]
pub struct FileClassifier {
    options: ClassifierOptions,
    render: PatternList,
    ignore: PatternList,
    ignore_render: PatternList,
    ignore_copy: PatternList,
    copy: PatternList,
    project_ignore: IgnorePatterns,
    auto_ignored: HashSet<PathBuf>,
    warnings: Vec<ClassifierWarning>,
}

impl Default for FileClassifier {
    fn default() -> Self {
        Self::new(ClassifierOptions::default())
    }
}

impl FileClassifier {
    pub fn new(options: ClassifierOptions) -> Self {
        let case_sensitive = options.case_sensitive;
        let mut copy = PatternList::new(case_sensitive);
        let assets_dir = options.assets_dir.trim_matches('/');
        if !assets_dir.is_empty() {
            // A plain directory name is always a valid glob.
            let _ = copy.add(&format!("{}/**", assets_dir));
        }

        Self {
            options,
            render: PatternList::new(case_sensitive),
            ignore: PatternList::new(case_sensitive),
            ignore_render: PatternList::new(case_sensitive),
            ignore_copy: PatternList::new(case_sensitive),
            copy,
            project_ignore: IgnorePatterns::empty(),
            auto_ignored: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Force matching renderable files to be emitted.
    pub fn add_render_pattern(&mut self, pattern: &str) -> Result<(), PatternError> {
        self.render.add(pattern)
    }

    /// Exclude matching files from both rendering and copying.
    pub fn add_ignore_pattern(&mut self, pattern: &str) -> Result<(), PatternError> {
        self.ignore.add(pattern)
    }

    /// Exclude matching renderable files from rendering only.
    pub fn add_render_ignore_pattern(&mut self, pattern: &str) -> Result<(), PatternError> {
        self.ignore_render.add(pattern)
    }

    /// Exclude matching non-renderable files from copying only.
    pub fn add_copy_ignore_pattern(&mut self, pattern: &str) -> Result<(), PatternError> {
        self.ignore_copy.add(pattern)?;
        if self.copy.contains(pattern) {
            self.warn_conflict(pattern);
        }
        Ok(())
    }

    /// Copy matching files; `!pattern` excludes.
    pub fn add_copy_pattern(&mut self, pattern: &str) -> Result<(), PatternError> {
        self.copy.add(pattern)?;
        if self.ignore_copy.contains(pattern) {
            self.warn_conflict(pattern);
        }
        Ok(())
    }

    /// Install rules derived from the project ignore file.
    pub fn set_project_ignore(&mut self, patterns: IgnorePatterns) {
        self.project_ignore = patterns;
    }

    /// Register a known layout or fragment file.
    pub fn add_auto_ignored(&mut self, rel_path: &Path) {
        self.auto_ignored.insert(normalize(rel_path));
    }

    pub fn set_auto_ignore(&mut self, enabled: bool) {
        self.options.auto_ignore = enabled;
    }

    pub fn warnings(&self) -> &[ClassifierWarning] {
        &self.warnings
    }

    pub fn options(&self) -> &ClassifierOptions {
        &self.options
    }

    pub fn is_renderable(&self, path: &Path) -> bool {
        has_extension(path, &self.options.renderable_extensions)
    }

    pub fn is_asset(&self, path: &Path) -> bool {
        has_extension(path, &self.options.asset_extensions)
    }

    /// Classify a path relative to the source root.
    pub fn classify(&self, rel_path: &Path) -> ClassificationResult {
        let rel = normalize(rel_path);
        let renderable = self.is_renderable(&rel);
        let auto_ignored = self.is_auto_ignored(&rel, renderable);

        // Tier 1: explicit overrides
        if renderable {
            if let PatternMatch::Matched(p) = self.render.matches(&rel) {
                return ClassificationResult::new(
                    FileAction::Emit,
                    Tier::Explicit,
                    "render forced by pattern",
                )
                .with_pattern(p);
            }
            if !self.options.auto_ignore && auto_ignored {
                return ClassificationResult::new(
                    FileAction::Emit,
                    Tier::Explicit,
                    "auto-ignore disabled",
                );
            }
        }

        // Tier 2: ignore rules
        if let PatternMatch::Matched(p) = self.ignore.matches(&rel) {
            return ClassificationResult::new(FileAction::Ignored, Tier::Ignore, "ignored by pattern")
                .with_pattern(p);
        }
        if let Some(p) = self.project_ignore.matched_pattern(&rel) {
            return ClassificationResult::new(
                FileAction::Ignored,
                Tier::Ignore,
                "ignored by project ignore file",
            )
            .with_pattern(&p);
        }
        if self.options.auto_ignore && auto_ignored {
            return ClassificationResult::new(
                FileAction::Ignored,
                Tier::Ignore,
                "layout or fragment file",
            );
        }
        if renderable {
            if let PatternMatch::Matched(p) = self.ignore_render.matches(&rel) {
                if let PatternMatch::Matched(copy) = self.copy.matches(&rel) {
                    if !self.ignore_copy.matches(&rel).is_match() {
                        return ClassificationResult::new(
                            FileAction::Copy,
                            Tier::Ignore,
                            "excluded from rendering, copied by pattern",
                        )
                        .with_pattern(copy);
                    }
                }
                return ClassificationResult::new(
                    FileAction::Ignored,
                    Tier::Ignore,
                    "excluded from rendering by pattern",
                )
                .with_pattern(p);
            }
        } else if let PatternMatch::Matched(p) = self.ignore_copy.matches(&rel) {
            return ClassificationResult::new(
                FileAction::Ignored,
                Tier::Ignore,
                "excluded from copying by pattern",
            )
            .with_pattern(p);
        }

        // Tier 3: defaults
        if renderable {
            return ClassificationResult::new(FileAction::Emit, Tier::Default, "renderable extension");
        }
        match self.copy.matches(&rel) {
            PatternMatch::Matched(p) => {
                return ClassificationResult::new(FileAction::Copy, Tier::Default, "copy pattern")
                    .with_pattern(p)
            }
            PatternMatch::Negated(p) => {
                return ClassificationResult::new(
                    FileAction::Skip,
                    Tier::Default,
                    "excluded by negated copy pattern",
                )
                .with_pattern(p)
            }
            PatternMatch::None => {}
        }
        if self.is_asset(&rel) {
            return ClassificationResult::new(FileAction::Copy, Tier::Default, "asset extension");
        }
        ClassificationResult::new(FileAction::Skip, Tier::Default, "unrecognized file type")
    }

    fn is_auto_ignored(&self, rel: &Path, renderable: bool) -> bool {
        if self.auto_ignored.contains(rel) {
            return true;
        }
        renderable
            && rel.components().any(|c| {
                c.as_os_str()
                    .to_str()
                    .map(|s| s.starts_with('_'))
                    .unwrap_or(false)
            })
    }

    fn warn_conflict(&mut self, pattern: &str) {
        let warning = ClassifierWarning::CopyIgnoreConflict {
            pattern: pattern.trim().to_string(),
        };
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

fn normalize(path: &Path) -> PathBuf {
    crate::domain::value_objects::normalize_relative(path)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(classifier: &FileClassifier, path: &str) -> ClassificationResult {
        classifier.classify(Path::new(path))
    }

    #[test]
    fn defaults_by_extension() {
        let c = FileClassifier::default();
        assert_eq!(classify(&c, "index.html").action, FileAction::Emit);
        assert_eq!(classify(&c, "blog/post.md").action, FileAction::Emit);
        assert_eq!(classify(&c, "img/logo.png").action, FileAction::Copy);
        assert_eq!(classify(&c, "notes.docx").action, FileAction::Skip);
        assert_eq!(classify(&c, "index.html").tier, Tier::Default);
    }

    #[test]
    fn assets_directory_copies_everything() {
        let c = FileClassifier::default();
        let result = classify(&c, "assets/data/blob.bin");
        assert_eq!(result.action, FileAction::Copy);
        assert_eq!(result.matched_pattern.as_deref(), Some("assets/**"));
    }

    #[test]
    fn negated_copy_pattern_skips_asset() {
        let mut c = FileClassifier::default();
        c.add_copy_pattern("assets/**").unwrap();
        c.add_copy_pattern("!assets/secret/**").unwrap();

        let secret = classify(&c, "assets/secret/x.png");
        assert_eq!(secret.action, FileAction::Skip);
        assert_eq!(secret.matched_pattern.as_deref(), Some("!assets/secret/**"));
        assert_eq!(classify(&c, "assets/logo.png").action, FileAction::Copy);
    }

    #[test]
    fn underscore_files_are_auto_ignored() {
        let c = FileClassifier::default();
        let layout = classify(&c, "_layout.html");
        assert_eq!(layout.action, FileAction::Ignored);
        assert_eq!(layout.tier, Tier::Ignore);
        assert_eq!(classify(&c, "_includes/nav.html").action, FileAction::Ignored);
        // Assets under underscore directories are still copied.
        assert_eq!(classify(&c, "_includes/nav.css").action, FileAction::Copy);
    }

    #[test]
    fn registered_fragment_is_auto_ignored() {
        let mut c = FileClassifier::default();
        c.add_auto_ignored(Path::new("partials/card.html"));
        assert_eq!(classify(&c, "partials/card.html").action, FileAction::Ignored);
        assert_eq!(classify(&c, "partials/other.html").action, FileAction::Emit);
    }

    #[test]
    fn disabling_auto_ignore_forces_emit() {
        let mut c = FileClassifier::default();
        c.set_auto_ignore(false);
        let result = classify(&c, "_draft.html");
        assert_eq!(result.action, FileAction::Emit);
        assert_eq!(result.tier, Tier::Explicit);
    }

    #[test]
    fn explicit_render_beats_ignore() {
        let mut c = FileClassifier::default();
        c.add_ignore_pattern("drafts/**").unwrap();
        c.add_render_pattern("drafts/ready.md").unwrap();

        assert_eq!(classify(&c, "drafts/wip.md").action, FileAction::Ignored);
        let ready = classify(&c, "drafts/ready.md");
        assert_eq!(ready.action, FileAction::Emit);
        assert_eq!(ready.tier, Tier::Explicit);
    }

    #[test]
    fn render_ignore_still_allows_copy() {
        let mut c = FileClassifier::default();
        c.add_render_ignore_pattern("raw/**").unwrap();
        c.add_copy_pattern("raw/**").unwrap();

        let result = classify(&c, "raw/page.html");
        assert_eq!(result.action, FileAction::Copy);
        assert_eq!(result.tier, Tier::Ignore);
    }

    #[test]
    fn render_ignore_without_copy_is_ignored() {
        let mut c = FileClassifier::default();
        c.add_render_ignore_pattern("*.htm").unwrap();
        assert_eq!(classify(&c, "old.htm").action, FileAction::Ignored);
        assert_eq!(classify(&c, "new.html").action, FileAction::Emit);
    }

    #[test]
    fn copy_ignore_does_not_block_rendering() {
        let mut c = FileClassifier::default();
        c.add_copy_ignore_pattern("docs/**").unwrap();
        assert_eq!(classify(&c, "docs/index.html").action, FileAction::Emit);
        assert_eq!(classify(&c, "docs/diagram.png").action, FileAction::Ignored);
    }

    #[test]
    fn project_ignore_rules_apply() {
        let mut c = FileClassifier::default();
        c.set_project_ignore(
            IgnorePatterns::from_content(Path::new(".gitignore"), "node_modules/\n"),
        );
        let result = classify(&c, "node_modules/pkg/index.js");
        assert_eq!(result.action, FileAction::Ignored);
        assert_eq!(result.matched_pattern.as_deref(), Some("node_modules/"));
    }

    #[test]
    fn invalid_pattern_fails_without_side_effects() {
        let mut c = FileClassifier::default();
        c.add_ignore_pattern("*.tmp").unwrap();
        assert!(c.add_ignore_pattern("bad{").is_err());
        assert_eq!(classify(&c, "x.tmp").action, FileAction::Ignored);
        assert_eq!(classify(&c, "index.html").action, FileAction::Emit);
    }

    #[test]
    fn identical_copy_and_ignore_copy_warns() {
        let mut c = FileClassifier::default();
        c.add_copy_pattern("media/**").unwrap();
        c.add_copy_ignore_pattern("media/**").unwrap();
        assert_eq!(
            c.warnings(),
            &[ClassifierWarning::CopyIgnoreConflict {
                pattern: "media/**".to_string()
            }]
        );
    }

    #[test]
    fn case_insensitive_option() {
        let mut c = FileClassifier::new(ClassifierOptions {
            case_sensitive: false,
            ..ClassifierOptions::default()
        });
        c.add_ignore_pattern("SECRET/**").unwrap();
        assert_eq!(classify(&c, "secret/a.html").action, FileAction::Ignored);
    }
}
