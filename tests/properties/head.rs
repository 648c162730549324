//! Property tests for `<head>` merging.

use std::collections::HashSet;

use proptest::prelude::*;

use weave::HeadSet;

/// Head elements that carry a deduplication key.
fn keyed_element() -> impl Strategy<Value = String> {
    (0..4u8, 0..5u8).prop_map(|(kind, n)| match kind {
        0 => format!("<title>Title {}</title>", n),
        1 => format!("<meta name=\"m{}\" content=\"c\">", n),
        2 => format!("<link rel=\"stylesheet\" href=\"/s{}.css\">", n),
        _ => format!("<script src=\"/j{}.js\"></script>", n),
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: Keys are unique after merging.
    #[test]
    fn property_merged_keys_are_unique(
        base in proptest::collection::vec(keyed_element(), 0..8),
        incoming in proptest::collection::vec(keyed_element(), 0..8),
    ) {
        let mut set = HeadSet::parse(&base.join("\n"));
        set.merge(HeadSet::parse(&incoming.join("\n")).entries().to_vec());

        let mut seen = HashSet::new();
        for entry in set.entries() {
            let key = entry.key().cloned();
            prop_assert!(key.is_some());
            prop_assert!(seen.insert(key), "duplicate key for {}", entry.html());
        }
    }

    /// PROPERTY: Merging a head into itself changes nothing.
    #[test]
    fn property_self_merge_is_idempotent(
        elements in proptest::collection::vec(keyed_element(), 0..10),
    ) {
        let head = elements.join("\n");
        let once = HeadSet::parse(&head);
        let mut twice = once.clone();
        twice.merge(HeadSet::parse(&head).entries().to_vec());
        prop_assert_eq!(once, twice);
    }
}
