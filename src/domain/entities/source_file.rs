//! SourceFile entity - a file from the source tree
//!
//! Source files are loaded on demand by the composer. Text-based kinds keep
//! their optional frontmatter parsed alongside the raw bytes.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Role a file plays in the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// A page that produces an output document
    Content,
    /// Reusable unit pulled in through an import directive
    Fragment,
    /// Wrapper document that receives page content via slots
    Layout,
    /// Static file copied verbatim
    Asset,
}

/// Layout directive carried in frontmatter or a `data-layout` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutDirective {
    /// Use the named layout (short name or path)
    Named(String),
    /// Explicitly render without a layout
    Disabled,
}

impl LayoutDirective {
    /// Interpret a raw directive value. `none`, `false` and an empty value
    /// disable the layout.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "" | "none" | "false" => LayoutDirective::Disabled,
            _ => LayoutDirective::Named(value.to_string()),
        }
    }
}

/// YAML frontmatter of a page or fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Layout directive; a string name or `false`
    #[serde(default)]
    pub layout: Option<serde_yaml_ng::Value>,

    /// Document title, used when synthesizing boilerplate
    #[serde(default)]
    pub title: Option<String>,

    /// Any other keys, preserved for downstream consumers
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml_ng::Value>,
}

impl Frontmatter {
    pub fn layout_directive(&self) -> Option<LayoutDirective> {
        match self.layout.as_ref()? {
            serde_yaml_ng::Value::Bool(false) | serde_yaml_ng::Value::Null => {
                Some(LayoutDirective::Disabled)
            }
            serde_yaml_ng::Value::String(s) => Some(LayoutDirective::parse(s)),
            _ => None,
        }
    }
}

/// A file read from the source tree.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    kind: FileKind,
    raw: Vec<u8>,
    frontmatter: Option<Frontmatter>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, kind: FileKind, raw: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            kind,
            raw,
            frontmatter: None,
        }
    }

    pub fn with_frontmatter(mut self, frontmatter: Option<Frontmatter>) -> Self {
        self.frontmatter = frontmatter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Content as text; invalid UTF-8 is replaced rather than rejected.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }

    pub fn frontmatter(&self) -> Option<&Frontmatter> {
        self.frontmatter.as_ref()
    }

    pub fn is_markdown(&self) -> bool {
        is_markdown_path(&self.path)
    }
}

pub fn is_markdown_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_directive_parsing() {
        assert_eq!(
            LayoutDirective::parse("blog"),
            LayoutDirective::Named("blog".to_string())
        );
        assert_eq!(LayoutDirective::parse("none"), LayoutDirective::Disabled);
        assert_eq!(LayoutDirective::parse(" FALSE "), LayoutDirective::Disabled);
        assert_eq!(LayoutDirective::parse(""), LayoutDirective::Disabled);
    }

    #[test]
    fn frontmatter_bool_false_disables_layout() {
        let fm: Frontmatter = serde_yaml_ng::from_str("layout: false").unwrap();
        assert_eq!(fm.layout_directive(), Some(LayoutDirective::Disabled));
    }

    #[test]
    fn frontmatter_without_layout_has_no_directive() {
        let fm: Frontmatter = serde_yaml_ng::from_str("title: x").unwrap();
        assert_eq!(fm.layout_directive(), None);
    }

    #[test]
    fn text_is_lossy_for_binary() {
        let file = SourceFile::new("x.html", FileKind::Fragment, vec![0xff, b'a']);
        assert!(file.text().ends_with('a'));
        assert!(!file.is_markdown());
    }

    #[test]
    fn markdown_detection_is_case_insensitive() {
        assert!(is_markdown_path(Path::new("README.MD")));
        assert!(is_markdown_path(Path::new("post.markdown")));
        assert!(!is_markdown_path(Path::new("page.html")));
    }
}
