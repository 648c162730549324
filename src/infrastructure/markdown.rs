//! pulldown-cmark markdown adapter

use std::path::Path;

use pulldown_cmark::{html, Options, Parser};

use crate::domain::ports::MarkdownRenderer;

/// CommonMark renderer with the GitHub-flavoured extensions enabled.
#[derive(Debug, Clone, Copy)]
pub struct PulldownRenderer {
    options: Options,
}

impl PulldownRenderer {
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_HEADING_ATTRIBUTES,
        }
    }
}

impl Default for PulldownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer for PulldownRenderer {
    fn render(&self, markdown: &str, _file_path: &Path) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_commonmark() {
        let html = PulldownRenderer::new().render("# Title\n\nSome *text*.", Path::new("a.md"));
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>text</em>"));
    }

    #[test]
    fn passes_inline_html_through() {
        let html = PulldownRenderer::new().render(
            "<div data-import=\"card\"></div>\n\ntext",
            Path::new("a.md"),
        );
        assert!(html.contains("data-import=\"card\""));
    }

    #[test]
    fn tables_are_enabled() {
        let html = PulldownRenderer::new().render("| a |\n|---|\n| b |\n", Path::new("t.md"));
        assert!(html.contains("<table>"));
    }
}
