//! Markdown renderer port
//!
//! Markdown-to-HTML conversion is an external collaborator; the composer only
//! sees this trait.

use std::path::Path;

pub trait MarkdownRenderer: Send + Sync {
    /// Render markdown text (frontmatter already stripped) to an HTML fragment.
    fn render(&self, markdown: &str, file_path: &Path) -> String;
}
