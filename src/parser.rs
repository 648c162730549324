//! Frontmatter parser for source files
//!
//! Pages and fragments may start with a YAML block delimited by `---` lines.
//! Unlike a strict document format, frontmatter here is optional: a file that
//! does not open with the delimiter is all body.

use std::path::Path;

use crate::domain::entities::Frontmatter;
use crate::error::{WeaveError, WeaveResult};

/// Delimiter for frontmatter sections
const FRONTMATTER_DELIMITER: &str = "---";

/// Result of splitting frontmatter from content
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFrontmatter<'a> {
    /// The raw YAML content, if the file has a frontmatter block
    pub yaml: Option<String>,
    /// The content body after the frontmatter
    pub body: &'a str,
}

/// Split optional frontmatter from file content.
///
/// An opening delimiter without a closing one is treated as plain body.
///
/// # Example
/// ```text
/// ---
/// layout: post
/// title: Hello
/// ---
/// # Heading
/// ```
pub fn split_frontmatter(content: &str) -> ExtractedFrontmatter<'_> {
    let content_no_bom = content.strip_prefix('\u{feff}').unwrap_or(content);
    let bom_len = content.len() - content_no_bom.len();
    let mut lines = content_no_bom.split_inclusive('\n');

    let first = match lines.next() {
        Some(first) if first.trim_end() == FRONTMATTER_DELIMITER => first,
        _ => {
            return ExtractedFrontmatter {
                yaml: None,
                body: content,
            }
        }
    };

    let mut offset = bom_len + first.len();
    let yaml_start = offset;

    for line in lines {
        if line.trim_end() == FRONTMATTER_DELIMITER {
            let yaml = content[yaml_start..offset].to_string();
            let body_start = offset + line.len();
            return ExtractedFrontmatter {
                yaml: Some(yaml),
                body: &content[body_start..],
            };
        }
        offset += line.len();
    }

    ExtractedFrontmatter {
        yaml: None,
        body: content,
    }
}

/// Parse frontmatter YAML into a [`Frontmatter`].
pub fn parse_frontmatter(yaml: &str, file: &Path) -> WeaveResult<Frontmatter> {
    if yaml.trim().is_empty() {
        return Ok(Frontmatter::default());
    }
    serde_yaml_ng::from_str(yaml).map_err(|e| WeaveError::Frontmatter {
        file: file.to_path_buf(),
        message: format_yaml_error(&e),
    })
}

/// Split and parse in one step, returning the body alongside.
pub fn read_frontmatter<'a>(
    content: &'a str,
    file: &Path,
) -> WeaveResult<(Option<Frontmatter>, &'a str)> {
    let extracted = split_frontmatter(content);
    match extracted.yaml {
        Some(yaml) => Ok((Some(parse_frontmatter(&yaml, file)?), extracted.body)),
        None => Ok((None, extracted.body)),
    }
}

fn format_yaml_error(err: &serde_yaml_ng::Error) -> String {
    match err.location() {
        Some(loc) => format!("line {}: {}", loc.line(), err),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::LayoutDirective;

    #[test]
    fn no_frontmatter_returns_whole_body() {
        let content = "<h1>Hello</h1>\n";
        let extracted = split_frontmatter(content);
        assert_eq!(extracted.yaml, None);
        assert_eq!(extracted.body, content);
    }

    #[test]
    fn splits_yaml_and_body() {
        let content = "---\nlayout: post\ntitle: Hi\n---\n# Body\n";
        let extracted = split_frontmatter(content);
        assert_eq!(extracted.yaml.as_deref(), Some("layout: post\ntitle: Hi\n"));
        assert_eq!(extracted.body, "# Body\n");
    }

    #[test]
    fn unclosed_block_is_plain_body() {
        let content = "---\nlayout: post\n# never closed\n";
        let extracted = split_frontmatter(content);
        assert_eq!(extracted.yaml, None);
        assert_eq!(extracted.body, content);
    }

    #[test]
    fn handles_crlf_line_endings() {
        let content = "---\r\ntitle: Win\r\n---\r\nbody";
        let extracted = split_frontmatter(content);
        assert_eq!(extracted.yaml.as_deref(), Some("title: Win\r\n"));
        assert_eq!(extracted.body, "body");
    }

    #[test]
    fn empty_block_parses_to_default() {
        let (fm, body) = read_frontmatter("---\n---\ntext", Path::new("a.md")).unwrap();
        assert_eq!(fm, Some(Frontmatter::default()));
        assert_eq!(body, "text");
    }

    #[test]
    fn parses_layout_and_extra_keys() {
        let (fm, _) = read_frontmatter(
            "---\nlayout: blog\ntitle: Post\ntags: [a, b]\n---\n",
            Path::new("p.md"),
        )
        .unwrap();
        let fm = fm.unwrap();
        assert_eq!(
            fm.layout_directive(),
            Some(LayoutDirective::Named("blog".to_string()))
        );
        assert_eq!(fm.title.as_deref(), Some("Post"));
        assert!(fm.extra.contains_key("tags"));
    }

    #[test]
    fn invalid_yaml_reports_file() {
        let err = parse_frontmatter("title: [unclosed", Path::new("bad.md")).unwrap_err();
        assert!(err.to_string().contains("bad.md"));
    }
}
