//! Property tests for the HTML scanner.

use proptest::prelude::*;

use weave::domain::services::html::{find_tag, parse_elements, strip_attribute, tokenize};

/// Markup-heavy input over a small alphabet; never contains `_`.
fn markup() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[<>/!a-z =\"'\\-é]{0,80}").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: The scanner never panics, on any input.
    #[test]
    fn property_scanner_never_panics(src in "(?s).{0,256}") {
        let _ = tokenize(&src);
        let _ = parse_elements(&src);
        let _ = find_tag(&src, "head");
        let _ = strip_attribute(&src, "data-layout");
    }

    /// PROPERTY: Tokens tile the input without gaps or overlaps.
    #[test]
    fn property_tokens_cover_input_in_order(src in markup()) {
        let mut pos = 0;
        for token in tokenize(&src) {
            let span = token.span();
            prop_assert_eq!(span.start, pos);
            prop_assert!(span.end > span.start);
            pos = span.end;
        }
        prop_assert_eq!(pos, src.len());
    }

    /// PROPERTY: Element ranges are valid slices of the source.
    #[test]
    fn property_element_ranges_slice_the_source(src in markup()) {
        for element in parse_elements(&src) {
            prop_assert!(src.is_char_boundary(element.outer.start));
            prop_assert!(src.is_char_boundary(element.outer.end));
            prop_assert!(element.outer.start <= element.inner.start);
            prop_assert!(element.inner.end <= element.outer.end);
            let _ = element.inner_html(&src);
        }
    }

    /// PROPERTY: Stripping an attribute nobody carries is the identity.
    #[test]
    fn property_strip_absent_attribute_is_identity(src in markup()) {
        prop_assert_eq!(strip_attribute(&src, "data_absent"), src);
    }
}
