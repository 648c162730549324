//! Property tests for frontmatter splitting.

use proptest::prelude::*;

use weave::{parse_frontmatter, split_frontmatter};

fn small_line() -> impl Strategy<Value = String> {
    // Printable and never a bare delimiter line.
    proptest::string::string_regex("[A-Za-z0-9 _:#\\-]{0,40}")
        .unwrap()
        .prop_filter("not a delimiter", |s| s.trim() != "---")
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: A delimited block splits into exactly its yaml and body.
    #[test]
    fn property_split_frontmatter_recovers_parts(
        yaml_lines in proptest::collection::vec(small_line(), 0..=8),
        body in "[A-Za-z0-9 <>/\\n]{0,120}",
    ) {
        let mut yaml = String::new();
        for line in &yaml_lines {
            yaml.push_str(line);
            yaml.push('\n');
        }
        let content = format!("---\n{}---\n{}", yaml, body);

        let split = split_frontmatter(&content);
        prop_assert_eq!(split.yaml.as_deref(), Some(yaml.as_str()));
        prop_assert_eq!(split.body, body.as_str());
    }

    /// PROPERTY: Content that does not open with a delimiter is all body.
    #[test]
    fn property_content_without_delimiter_is_body(
        content in "[A-Za-z0-9 <>#\\n]{0,200}",
    ) {
        let split = split_frontmatter(&content);
        prop_assert!(split.yaml.is_none());
        prop_assert_eq!(split.body, content.as_str());
    }

    /// PROPERTY: `parse_frontmatter` never panics on arbitrary input.
    #[test]
    fn property_parse_frontmatter_never_panics(
        yaml in "(?s).{0,256}"
    ) {
        let _ = parse_frontmatter(&yaml, std::path::Path::new("page.md"));
    }
}
