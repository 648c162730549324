//! Composition engine
//!
//! Turns a page into a finished document:
//!
//! 1. import directives (`data-import`) are expanded depth-first, each
//!    fragment receiving the caller's slot content
//! 2. the page's layout (and any layout that layout names) wraps the result
//! 3. a final pass fills leftover placeholders with their fallback content,
//!    merges queued head content, strips directive attributes and, for pages
//!    with no layout, synthesizes document boilerplate
//!
//! Every file consulted along the way is returned as a [`DependencySet`] so
//! the build cache can invalidate conservatively. Candidates probed before a
//! reference or layout lookup settled are returned too, as absent entries.

mod slots;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

pub use slots::{finalize_slots, inject, SlotContent, HEAD_SLOT, SLOT_TAG, TARGET_ATTR};

use super::head::{self, HeadElement, HeadMerge};
use super::html;
use super::layout_resolver::{
    explicit_directive, LayoutResolution, LayoutResolver, LayoutSource, LAYOUT_ATTR,
};
use super::reference::{local_target, normalize_path, ReferenceResolver};
use crate::domain::entities::{
    is_markdown_path, DependencySet, EdgeKind, FileKind, Frontmatter, LayoutDirective, SourceFile,
};
use crate::domain::ports::{FileSystem, MarkdownRenderer};
use crate::error::{WeaveError, WeaveResult};
use crate::parser::read_frontmatter;

/// Attribute marking an import directive
pub const IMPORT_ATTR: &str = "data-import";

/// Default composition recursion ceiling
pub const DEFAULT_MAX_DEPTH: usize = 10;

const RENDERABLE_EXTENSIONS: &[&str] = &["html", "htm", "md", "markdown"];

#[derive(Debug, Clone)]
pub struct ComposeOptions {
    pub max_depth: usize,
    /// Missing fragments fail the page instead of leaving a placeholder
    pub strict: bool,
    /// Wrap layout-less fragments in `<!DOCTYPE html>` boilerplate
    pub synthesize_boilerplate: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
            synthesize_boilerplate: true,
        }
    }
}

/// An import directive as found in a host document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportNode {
    pub reference: String,
    pub resolved: Option<PathBuf>,
    pub slots: SlotContent,
}

/// Final HTML plus the head elements merged into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposedDocument {
    pub html: String,
    pub head_elements: Vec<HeadElement>,
}

/// Recoverable problems noticed while composing a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeWarning {
    MissingFragment {
        reference: String,
        from: PathBuf,
        candidates: Vec<PathBuf>,
    },
    /// A layout could not be read or resolved; the page was composed without it
    Layout { file: PathBuf, message: String },
    /// Head content had no `<head>` to merge into and was dropped
    OrphanHead { count: usize },
}

impl fmt::Display for ComposeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeWarning::MissingFragment {
                reference,
                from,
                candidates,
            } => write!(
                f,
                "fragment '{}' not found (imported from {}, {} candidates searched)",
                reference,
                from.display(),
                candidates.len()
            ),
            ComposeWarning::Layout { file, message } => {
                write!(f, "layout problem in {}: {}", file.display(), message)
            }
            ComposeWarning::OrphanHead { count } => {
                write!(f, "{} head element(s) dropped: document has no <head>", count)
            }
        }
    }
}

/// Everything produced by composing one page.
#[derive(Debug, Clone)]
pub struct Composition {
    pub document: ComposedDocument,
    pub layout: LayoutResolution,
    pub dependencies: DependencySet,
    pub warnings: Vec<ComposeWarning>,
    pub frontmatter: Option<Frontmatter>,
}

pub struct Composer {
    fs: Arc<dyn FileSystem>,
    markdown: Arc<dyn MarkdownRenderer>,
    layouts: Arc<LayoutResolver>,
    options: ComposeOptions,
}

impl Composer {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        markdown: Arc<dyn MarkdownRenderer>,
        layouts: Arc<LayoutResolver>,
        options: ComposeOptions,
    ) -> Self {
        Self {
            fs,
            markdown,
            layouts,
            options,
        }
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    pub fn layouts(&self) -> &LayoutResolver {
        &self.layouts
    }

    /// Read `path` and compose it.
    pub fn compose_file(&self, path: &Path, source_root: &Path) -> WeaveResult<Composition> {
        let raw = self.fs.read_bytes(path)?;
        self.compose(&SourceFile::new(path, FileKind::Content, raw), source_root)
    }

    /// Compose a page into a finished document.
    pub fn compose(&self, page: &SourceFile, source_root: &Path) -> WeaveResult<Composition> {
        let path = normalize_path(page.path());
        let text = page.text();
        let (frontmatter, body) = read_frontmatter(&text, &path)?;
        let frontmatter = frontmatter.or_else(|| page.frontmatter().cloned());

        debug!(page = %path.display(), "composing");

        let mut pass = Pass {
            composer: self,
            source_root,
            stack: vec![path.clone()],
            dependencies: DependencySet::new(),
            warnings: Vec::new(),
            pending_head: Vec::new(),
            merged_head: Vec::new(),
        };

        let content = pass.render_source(&path, body);
        let mut html = pass.expand_imports(content, &path, 0)?;

        let layout = self.layouts.resolve_layout(&path, &text, source_root);
        for missed in &layout.probed {
            pass.dependencies.insert_absent(missed.clone(), EdgeKind::Layout);
        }
        if let Some(message) = &layout.error {
            warn!(page = %path.display(), error = %message, "layout resolution degraded");
            pass.warnings.push(ComposeWarning::Layout {
                file: path.clone(),
                message: message.clone(),
            });
        }
        if let Some(layout_path) = &layout.layout_path {
            html = pass.apply_layout(html, layout_path, 0)?;
        }

        let boilerplate = self.options.synthesize_boilerplate
            && layout.layout_path.is_none()
            && layout.source != LayoutSource::Explicit;
        let title = frontmatter
            .as_ref()
            .and_then(|f| f.title.clone())
            .unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
        let html = pass.finalize(html, boilerplate.then_some(title.as_str()), &path);

        Ok(Composition {
            document: ComposedDocument {
                html,
                head_elements: pass.merged_head,
            },
            layout,
            dependencies: pass.dependencies,
            warnings: pass.warnings,
            frontmatter,
        })
    }
}

/// Mutable state of one page composition.
struct Pass<'a> {
    composer: &'a Composer,
    source_root: &'a Path,
    /// Files currently being composed, outermost first
    stack: Vec<PathBuf>,
    dependencies: DependencySet,
    warnings: Vec<ComposeWarning>,
    /// Head content that found no `<head>` yet
    pending_head: Vec<HeadElement>,
    merged_head: Vec<HeadElement>,
}

impl<'a> Pass<'a> {
    fn references(&self) -> ReferenceResolver<'_> {
        ReferenceResolver::new(
            self.composer.fs.as_ref(),
            self.source_root,
            &self.composer.layouts.options().includes_dir,
        )
    }

    fn render_source(&self, path: &Path, body: &str) -> String {
        if is_markdown_path(path) {
            self.composer.markdown.render(body, path)
        } else {
            body.to_string()
        }
    }

    /// Read a fragment or layout, dropping its frontmatter and rendering
    /// markdown. Returns the raw text alongside for directive lookup.
    fn load(&self, path: &Path) -> WeaveResult<(String, String)> {
        let raw = self.composer.fs.read(path)?;
        let (_, body) = read_frontmatter(&raw, path)?;
        let rendered = self.render_source(path, body);
        Ok((raw, rendered))
    }

    /// Push `target` onto the in-flight stack after the cycle and depth checks.
    fn enter(&mut self, target: &Path, depth: usize) -> WeaveResult<()> {
        if self.stack.iter().any(|p| p == target) {
            let mut chain = self.stack.clone();
            chain.push(target.to_path_buf());
            return Err(WeaveError::CircularImport { chain });
        }
        let max = self.composer.options.max_depth;
        if depth > max {
            return Err(WeaveError::DepthExceeded {
                depth,
                max,
                file: target.to_path_buf(),
            });
        }
        self.stack.push(target.to_path_buf());
        Ok(())
    }

    fn leave(&mut self) {
        self.stack.pop();
    }

    /// Expand every import directive in `content` until none remain.
    fn expand_imports(&mut self, content: String, host: &Path, depth: usize) -> WeaveResult<String> {
        let mut content = content;
        while let Some(element) = html::find_element(&content, |e| e.has_attr(IMPORT_ATTR)) {
            let node = ImportNode {
                reference: element.attr(IMPORT_ATTR).unwrap_or_default().trim().to_string(),
                resolved: None,
                slots: SlotContent::partition(element.inner_html(&content)),
            };
            let replacement = self.expand_import(node, host, depth)?;
            content = html::splice(&content, element.outer.clone(), &replacement);
        }
        Ok(content)
    }

    fn expand_import(&mut self, mut node: ImportNode, host: &Path, depth: usize) -> WeaveResult<String> {
        // Caller content belongs to the host and is expanded in its context.
        node.slots = std::mem::take(&mut node.slots)
            .try_map(|bucket| self.expand_imports(bucket, host, depth))?;

        let lookup = self.references().lookup(&node.reference, host);
        for missed in &lookup.missed {
            self.dependencies.insert_absent(missed.clone(), EdgeKind::Fragment);
        }
        let target = match lookup.found {
            Some(target) => target,
            None => return self.missing_fragment(node, host, lookup.missed),
        };
        node.resolved = Some(target.clone());

        let depth = depth + 1;
        self.enter(&target, depth)?;
        self.dependencies.insert(target.clone(), EdgeKind::Fragment);

        let (_, body) = self.load(&target)?;
        let body = self.expand_imports(body, &target, depth)?;
        self.leave();

        let head = node.slots.take_head();
        let mut out = inject(&body, &node.slots);
        if let Some(head) = head {
            out = self.merge_head(out, head_elements_of(&head));
        }
        Ok(out)
    }

    fn missing_fragment(
        &mut self,
        node: ImportNode,
        host: &Path,
        candidates: Vec<PathBuf>,
    ) -> WeaveResult<String> {
        if self.composer.options.strict {
            return Err(WeaveError::FragmentNotFound {
                reference: node.reference,
                from: host.to_path_buf(),
                candidates,
            });
        }
        // Pages with unresolved imports are recomposed on every build.
        if let Some(first) = candidates.first() {
            self.dependencies.insert(first.clone(), EdgeKind::Fragment);
        }
        warn!(
            reference = %node.reference,
            from = %host.display(),
            "fragment not found"
        );
        let placeholder = format!(
            "<!-- weave: fragment '{}' not found -->",
            html::comment_safe(&node.reference)
        );
        self.warnings.push(ComposeWarning::MissingFragment {
            reference: node.reference,
            from: host.to_path_buf(),
            candidates,
        });
        Ok(placeholder)
    }

    /// Wrap `content` in the layout at `layout_path`, following layouts that
    /// name a layout of their own.
    fn apply_layout(&mut self, content: String, layout_path: &Path, depth: usize) -> WeaveResult<String> {
        let (mut slots, mut head) = page_slots(&content);
        if let Some(targeted) = slots.take_head() {
            head.extend(head_elements_of(&targeted));
        }

        let depth = depth + 1;
        self.enter(layout_path, depth)?;
        self.dependencies
            .insert(layout_path.to_path_buf(), EdgeKind::Layout);

        let (raw, body) = self.load(layout_path)?;
        let body = self.expand_imports(body, layout_path, depth)?;
        let mut out = inject(&body, &slots);
        if !head.is_empty() {
            out = self.merge_head(out, head);
        }

        match explicit_directive(layout_path, &raw) {
            Ok(Some(LayoutDirective::Named(name))) => {
                let lookup = self
                    .composer
                    .layouts
                    .lookup_name(&name, layout_path, self.source_root);
                for missed in &lookup.missed {
                    self.dependencies.insert_absent(missed.clone(), EdgeKind::Layout);
                }
                match lookup.found {
                    Some(parent) => out = self.apply_layout(out, &parent, depth)?,
                    None => self.warnings.push(ComposeWarning::Layout {
                        file: layout_path.to_path_buf(),
                        message: format!("parent layout '{}' not found", name),
                    }),
                }
            }
            Ok(_) => {}
            Err(e) => self.warnings.push(ComposeWarning::Layout {
                file: layout_path.to_path_buf(),
                message: e.to_string(),
            }),
        }

        self.leave();
        Ok(out)
    }

    /// Merge head elements into `document`, or queue them when it has no head.
    fn merge_head(&mut self, document: String, elements: Vec<HeadElement>) -> String {
        if elements.is_empty() {
            return document;
        }
        match head::merge_into_document(&document, &elements) {
            HeadMerge::Merged(html) => {
                self.merged_head.extend(elements);
                html
            }
            HeadMerge::NoHead => {
                self.pending_head.extend(elements);
                document
            }
        }
    }

    fn finalize(&mut self, content: String, boilerplate_title: Option<&str>, page: &Path) -> String {
        let mut html = finalize_slots(&content);
        html = html::strip_attribute(&html, LAYOUT_ATTR);

        let pending = std::mem::take(&mut self.pending_head);
        if let Some(title) = boilerplate_title {
            if html::find_tag(&html, "html").is_none() {
                html = synthesize_document(&html, title);
            }
        }
        if !pending.is_empty() {
            let count = pending.len();
            html = self.merge_head(html, pending);
            if !self.pending_head.is_empty() {
                self.pending_head.clear();
                self.warnings.push(ComposeWarning::OrphanHead { count });
            }
        }

        self.record_assets(&html, page);
        html
    }

    /// Record local `href`/`src` targets that exist on disk as asset edges.
    fn record_assets(&mut self, html: &str, page: &Path) {
        let root = normalize_path(self.source_root);
        let page_dir = page.parent().unwrap_or(self.source_root).to_path_buf();

        for element in html::parse_elements(html) {
            for attr in ["href", "src"] {
                let Some(value) = element.attr(attr) else {
                    continue;
                };
                let Some(target) = local_target(value, &root, &page_dir) else {
                    continue;
                };
                if is_renderable(&target) || !self.composer.fs.is_file(&target) {
                    continue;
                }
                self.dependencies.insert(target, EdgeKind::Asset);
            }
        }
    }
}

/// Split a page (or an inner layout's output) into the head elements it
/// contributes and the slot content for the enclosing layout.
fn page_slots(content: &str) -> (SlotContent, Vec<HeadElement>) {
    let mut head = Vec::new();
    let mut body_source = content.to_string();

    if let Some(head_el) = html::find_tag(content, "head") {
        head = head::parse_head_elements(head_el.inner_html(content));
        body_source = html::splice(content, head_el.outer.clone(), "");
    }

    let body_source = if let Some(body) = html::find_tag(&body_source, "body") {
        body.inner_html(&body_source).to_string()
    } else if let Some(wrapper) = html::find_element(&body_source, |e| {
        matches!(e.name.as_str(), "html" | "template") && e.has_attr(LAYOUT_ATTR)
    }) {
        // A wrapper that exists only to carry the directive is unwrapped.
        wrapper.inner_html(&body_source).to_string()
    } else {
        body_source
    };

    (SlotContent::partition(&body_source), head)
}

fn head_elements_of(markup: &str) -> Vec<HeadElement> {
    match html::find_tag(markup, "head") {
        Some(head_el) => head::parse_head_elements(head_el.inner_html(markup)),
        None => head::parse_head_elements(markup),
    }
}

fn synthesize_document(body: &str, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        html::escape_text(title),
        body.trim()
    )
}

fn is_renderable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| RENDERABLE_EXTENSIONS.iter().any(|r| e.eq_ignore_ascii_case(r)))
        .unwrap_or(false)
}
