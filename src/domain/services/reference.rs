//! Import and layout reference resolution
//!
//! A reference is the value of a `data-import` / `data-layout` directive or a
//! configured layout name. Three forms are understood:
//!
//! - root-absolute: `/components/card.html`
//! - file-relative: `./card.html`, `../shared/nav.html`, `partials/nav.html`
//! - short names: `card` or `card.html`, probed in the current directory,
//!   each ancestor up to the source root, then the includes directory
//!
//! Resolution never reads file contents; it only probes for existence.

use std::path::{Component, Path, PathBuf};

use crate::domain::ports::FileSystem;

/// Default reserved directory for shared fragments and layouts
pub const DEFAULT_INCLUDES_DIR: &str = "_includes";

/// Outcome of probing a candidate list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookup {
    pub found: Option<PathBuf>,
    /// Candidates probed before the hit (all of them on a miss)
    pub missed: Vec<PathBuf>,
}

impl Lookup {
    /// First existing entry of `candidates`.
    pub fn probe(fs: &dyn FileSystem, candidates: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut lookup = Lookup::default();
        for candidate in candidates {
            if fs.is_file(&candidate) {
                lookup.found = Some(candidate);
                break;
            }
            lookup.missed.push(candidate);
        }
        lookup
    }

    pub fn into_result(self) -> Result<PathBuf, Vec<PathBuf>> {
        self.found.ok_or(self.missed)
    }
}

/// Resolves references against a source root.
pub struct ReferenceResolver<'a> {
    fs: &'a dyn FileSystem,
    source_root: &'a Path,
    includes_dir: &'a str,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(fs: &'a dyn FileSystem, source_root: &'a Path, includes_dir: &'a str) -> Self {
        Self {
            fs,
            source_root,
            includes_dir,
        }
    }

    /// Resolve `reference` as seen from `from_file`.
    ///
    /// On failure returns every candidate that was probed, in probe order.
    pub fn resolve(&self, reference: &str, from_file: &Path) -> Result<PathBuf, Vec<PathBuf>> {
        self.lookup(reference, from_file).into_result()
    }

    /// Resolve `reference`, keeping the candidates that were missing.
    pub fn lookup(&self, reference: &str, from_file: &Path) -> Lookup {
        Lookup::probe(self.fs, self.candidates(reference, from_file))
    }

    /// Ordered probe list for `reference`. Candidates outside the source root
    /// are dropped.
    pub fn candidates(&self, reference: &str, from_file: &Path) -> Vec<PathBuf> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Vec::new();
        }

        let from_dir = from_file.parent().unwrap_or(self.source_root);
        let mut out = Vec::new();

        if let Some(rooted) = reference.strip_prefix('/') {
            self.push_with_html_fallback(&mut out, self.source_root.join(rooted));
        } else if reference.starts_with("./") || reference.starts_with("../") {
            self.push_with_html_fallback(&mut out, from_dir.join(reference));
        } else if reference.contains('/') {
            self.push_with_html_fallback(&mut out, from_dir.join(reference));
            self.push_with_html_fallback(&mut out, self.source_root.join(reference));
        } else {
            let names = short_name_variants(reference);
            for dir in self.ancestor_dirs(from_dir) {
                for name in &names {
                    self.push(&mut out, dir.join(name));
                }
            }
            let includes = self.includes_path();
            for name in &names {
                self.push(&mut out, includes.join(name));
            }
        }
        out
    }

    /// Directories from `start` up to and including the source root.
    pub fn ancestor_dirs(&self, start: &Path) -> Vec<PathBuf> {
        let root = normalize_path(self.source_root);
        let mut current = normalize_path(start);
        if !current.starts_with(&root) {
            return vec![root];
        }

        let mut dirs = Vec::new();
        loop {
            dirs.push(current.clone());
            if current == root {
                break;
            }
            match current.parent() {
                Some(parent) if parent.starts_with(&root) => current = parent.to_path_buf(),
                _ => break,
            }
        }
        dirs
    }

    pub fn includes_path(&self) -> PathBuf {
        normalize_path(&self.source_root.join(self.includes_dir))
    }

    fn push(&self, out: &mut Vec<PathBuf>, candidate: PathBuf) {
        let candidate = normalize_path(&candidate);
        if candidate.starts_with(normalize_path(self.source_root)) && !out.contains(&candidate) {
            out.push(candidate);
        }
    }

    fn push_with_html_fallback(&self, out: &mut Vec<PathBuf>, candidate: PathBuf) {
        let needs_extension = candidate.extension().is_none();
        self.push(out, candidate.clone());
        if needs_extension {
            self.push(out, candidate.with_extension("html"));
        }
    }
}

/// File names probed for a short reference, in priority order.
///
/// `card` → `card.html`, `_card.html`, `card.layout.html`, `_card.layout.html`.
/// A name that already carries an extension is probed as-is, then
/// underscore-prefixed.
pub fn short_name_variants(name: &str) -> Vec<String> {
    if Path::new(name).extension().is_some() {
        let mut names = vec![name.to_string()];
        if !name.starts_with('_') {
            names.push(format!("_{}", name));
        }
        return names;
    }
    let bare = name.trim_start_matches('_');
    vec![
        format!("{}.html", bare),
        format!("_{}.html", bare),
        format!("{}.layout.html", bare),
        format!("_{}.layout.html", bare),
    ]
}

/// Lexically normalize a path: drop `.` and fold `..` without touching disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Map an `href`/`src`/`url()` value to a path under `root`, if it is local.
/// Root-absolute values resolve against `root`, others against `from_dir`.
pub fn local_target(value: &str, root: &Path, from_dir: &Path) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() || value.starts_with('#') || value.starts_with("//") {
        return None;
    }
    // Any URL scheme (http:, data:, mailto:, ...) is external.
    if let Some(colon) = value.find(':') {
        let scheme = &value[..colon];
        if !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return None;
        }
    }
    let path = value.split(['?', '#']).next().unwrap_or_default();
    if path.is_empty() {
        return None;
    }

    let candidate = match path.strip_prefix('/') {
        Some(rooted) => root.join(rooted),
        None => from_dir.join(path),
    };
    let candidate = normalize_path(&candidate);
    candidate.starts_with(root).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fs::LocalFs;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn local_targets() {
        let root = Path::new("/site");
        let dir = Path::new("/site/blog");
        assert_eq!(
            local_target("/css/a.css?v=1", root, dir),
            Some(PathBuf::from("/site/css/a.css"))
        );
        assert_eq!(
            local_target("../img/x.png#frag", root, dir),
            Some(PathBuf::from("/site/img/x.png"))
        );
        assert_eq!(local_target("https://cdn.example/a.js", root, dir), None);
        assert_eq!(local_target("//cdn.example/a.js", root, dir), None);
        assert_eq!(local_target("data:image/png;base64,xx", root, dir), None);
        assert_eq!(local_target("#top", root, dir), None);
        assert_eq!(local_target("../../etc/passwd", root, dir), None);
    }

    #[test]
    fn normalize_folds_parent_components() {
        assert_eq!(
            normalize_path(Path::new("/site/blog/../_includes/./nav.html")),
            PathBuf::from("/site/_includes/nav.html")
        );
    }

    #[test]
    fn short_name_variant_order() {
        assert_eq!(
            short_name_variants("card"),
            vec![
                "card.html",
                "_card.html",
                "card.layout.html",
                "_card.layout.html"
            ]
        );
        assert_eq!(short_name_variants("nav.html"), vec!["nav.html", "_nav.html"]);
    }

    #[test]
    fn root_absolute_reference() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("components/card.html"));
        let fs = LocalFs::new();
        let resolver = ReferenceResolver::new(&fs, root, DEFAULT_INCLUDES_DIR);

        let found = resolver
            .resolve("/components/card.html", &root.join("blog/post.html"))
            .unwrap();
        assert_eq!(found, normalize_path(&root.join("components/card.html")));
    }

    #[test]
    fn root_absolute_without_extension_tries_html() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("components/card.html"));
        let fs = LocalFs::new();
        let resolver = ReferenceResolver::new(&fs, root, DEFAULT_INCLUDES_DIR);

        assert!(resolver
            .resolve("/components/card", &root.join("index.html"))
            .is_ok());
    }

    #[test]
    fn short_name_walks_up_then_includes() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("_includes/_footer.html"));
        touch(&root.join("blog/_card.html"));
        let fs = LocalFs::new();
        let resolver = ReferenceResolver::new(&fs, root, DEFAULT_INCLUDES_DIR);
        let page = root.join("blog/2024/post.html");

        assert_eq!(
            resolver.resolve("card", &page).unwrap(),
            normalize_path(&root.join("blog/_card.html"))
        );
        assert_eq!(
            resolver.resolve("footer", &page).unwrap(),
            normalize_path(&root.join("_includes/_footer.html"))
        );
    }

    #[test]
    fn nearest_directory_wins() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("_card.html"));
        touch(&root.join("docs/card.layout.html"));
        let fs = LocalFs::new();
        let resolver = ReferenceResolver::new(&fs, root, DEFAULT_INCLUDES_DIR);

        assert_eq!(
            resolver.resolve("card", &root.join("docs/a.html")).unwrap(),
            normalize_path(&root.join("docs/card.layout.html"))
        );
    }

    #[test]
    fn lookup_keeps_candidates_probed_before_the_hit() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("_includes/card.html"));
        let fs = LocalFs::new();
        let resolver = ReferenceResolver::new(&fs, root, DEFAULT_INCLUDES_DIR);

        let lookup = resolver.lookup("card", &root.join("blog/post.html"));
        assert_eq!(
            lookup.found,
            Some(normalize_path(&root.join("_includes/card.html")))
        );
        // 4 variants in blog/, 4 in root; the includes hit was the first tried there.
        assert_eq!(lookup.missed.len(), 8);
        assert_eq!(lookup.missed[0], normalize_path(&root.join("blog/card.html")));
        assert!(!lookup
            .missed
            .contains(&normalize_path(&root.join("_includes/card.html"))));
    }

    #[test]
    fn missing_reference_lists_candidates() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let fs = LocalFs::new();
        let resolver = ReferenceResolver::new(&fs, root, DEFAULT_INCLUDES_DIR);

        let candidates = resolver
            .resolve("ghost", &root.join("a/b.html"))
            .unwrap_err();
        // 4 variants in a/, 4 in root, 4 in _includes
        assert_eq!(candidates.len(), 12);
        assert!(candidates[0].ends_with("a/ghost.html"));
        assert!(candidates.last().unwrap().ends_with("_includes/_ghost.layout.html"));
    }

    #[test]
    fn escaping_the_root_is_not_a_candidate() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("site");
        fs::create_dir_all(&root).unwrap();
        touch(&dir.path().join("secret.html"));
        let fs = LocalFs::new();
        let resolver = ReferenceResolver::new(&fs, &root, DEFAULT_INCLUDES_DIR);

        let result = resolver.resolve("../secret.html", &root.join("index.html"));
        assert_eq!(result, Err(vec![]));
    }

    #[test]
    fn nested_relative_path_falls_back_to_root() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("partials/nav.html"));
        let fs = LocalFs::new();
        let resolver = ReferenceResolver::new(&fs, root, DEFAULT_INCLUDES_DIR);

        assert_eq!(
            resolver
                .resolve("partials/nav.html", &root.join("blog/post.html"))
                .unwrap(),
            normalize_path(&root.join("partials/nav.html"))
        );
    }
}
