//! Property tests for file classification.

use std::path::PathBuf;

use proptest::prelude::*;

use weave::{FileAction, FileClassifier};

fn segment() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9-]{0,7}").unwrap()
}

fn rel_path(ext: &'static str) -> impl Strategy<Value = PathBuf> {
    (proptest::collection::vec(segment(), 0..=3), segment()).prop_map(move |(dirs, stem)| {
        let mut path: PathBuf = dirs.iter().collect();
        path.push(format!("{}.{}", stem, ext));
        path
    })
}

fn any_ext() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("html"),
        Just("md"),
        Just("css"),
        Just("png"),
        Just("docx"),
        Just("bak"),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: Classification depends only on the path and the registered rules.
    #[test]
    fn property_classification_is_deterministic(
        path in any_ext().prop_flat_map(rel_path),
    ) {
        let build = || {
            let mut c = FileClassifier::default();
            c.add_ignore_pattern("drafts/**").unwrap();
            c.add_copy_pattern("downloads/**").unwrap();
            c
        };
        prop_assert_eq!(build().classify(&path), build().classify(&path));
    }

    /// PROPERTY: Without render overrides an ignore pattern always wins.
    #[test]
    fn property_ignored_directory_is_never_emitted(
        path in any_ext().prop_flat_map(rel_path),
    ) {
        let mut c = FileClassifier::default();
        c.add_ignore_pattern("drafts/**").unwrap();
        let result = c.classify(&PathBuf::from("drafts").join(&path));
        prop_assert_eq!(result.action, FileAction::Ignored);
    }

    /// PROPERTY: Underscore-prefixed renderables are auto-ignored, and forced
    /// back to emit when auto-ignore is off.
    #[test]
    fn property_underscore_renderables_follow_auto_ignore(
        dir in segment(),
        stem in segment(),
        ext in prop_oneof![Just("html"), Just("md")],
    ) {
        let path = PathBuf::from(&dir).join(format!("_{}.{}", stem, ext));

        let c = FileClassifier::default();
        prop_assert_eq!(c.classify(&path).action, FileAction::Ignored);

        let mut c = FileClassifier::default();
        c.set_auto_ignore(false);
        prop_assert_eq!(c.classify(&path).action, FileAction::Emit);
    }

    /// PROPERTY: Files with unknown extensions are skipped unless a copy rule
    /// claims them.
    #[test]
    fn property_unknown_extensions_skip_outside_copy_patterns(
        path in rel_path("bak"),
    ) {
        let c = FileClassifier::default();
        let expected = if path.starts_with("assets") {
            FileAction::Copy
        } else {
            FileAction::Skip
        };
        prop_assert_eq!(c.classify(&path).action, expected);
    }
}
