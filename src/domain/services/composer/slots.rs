//! Slot partitioning and injection

use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

use crate::domain::services::html::{self, Element};

pub const SLOT_TAG: &str = "slot";
pub const TARGET_ATTR: &str = "data-target";
pub const HEAD_SLOT: &str = "head";

/// Caller-supplied content for a fragment or layout.
///
/// Children carrying `data-target="name"` go to the named bucket (a
/// `<template>` contributes its inner HTML, any other element contributes
/// itself minus the attribute). Everything else forms the default bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotContent {
    pub default: String,
    pub named: BTreeMap<String, String>,
}

impl SlotContent {
    pub fn partition(content: &str) -> Self {
        let mut slots = SlotContent::default();
        let mut removed: Vec<Range<usize>> = Vec::new();

        for element in html::top_level_elements(content) {
            let Some(name) = element.attr(TARGET_ATTR).map(str::trim) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let value = if element.name == "template" {
                element.inner_html(content).to_string()
            } else {
                html::strip_attribute(element.outer_html(content), TARGET_ATTR)
            };
            // Duplicate targets: the later one wins.
            slots.named.insert(name.to_string(), value);
            removed.push(element.outer.clone());
        }

        let mut default = content.to_string();
        for range in removed.into_iter().rev() {
            default = html::splice(&default, range, "");
        }
        slots.default = default;
        slots
    }

    pub fn has_default(&self) -> bool {
        !self.default.trim().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_default() && self.named.is_empty()
    }

    /// Remove and return the `head` bucket.
    pub fn take_head(&mut self) -> Option<String> {
        self.named.remove(HEAD_SLOT)
    }

    /// Apply `f` to every bucket.
    pub fn try_map<E>(self, mut f: impl FnMut(String) -> Result<String, E>) -> Result<Self, E> {
        let default = f(self.default)?;
        let named = self
            .named
            .into_iter()
            .map(|(name, value)| f(value).map(|v| (name, v)))
            .collect::<Result<_, E>>()?;
        Ok(Self { default, named })
    }
}

fn slot_name(element: &Element) -> Option<&str> {
    element
        .attr("name")
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// Fill placeholders in `template` from `slots`.
///
/// A named bucket fills the first placeholder with that name, the default
/// bucket fills the first unnamed placeholder. Placeholders with no content
/// are left untouched for an enclosing pass.
pub fn inject(template: &str, slots: &SlotContent) -> String {
    if slots.is_empty() {
        return template.to_string();
    }

    let mut filled_names: HashSet<&str> = HashSet::new();
    let mut default_used = false;
    let mut replacements: Vec<(Range<usize>, &str)> = Vec::new();

    for element in html::parse_elements(template) {
        if element.name != SLOT_TAG {
            continue;
        }
        if replacements
            .iter()
            .any(|(range, _)| range.start <= element.outer.start && element.outer.end <= range.end)
        {
            continue;
        }
        match slot_name(&element) {
            Some(name) => {
                if filled_names.contains(name) {
                    continue;
                }
                if let Some((key, value)) = slots.named.get_key_value(name) {
                    filled_names.insert(key.as_str());
                    replacements.push((element.outer.clone(), value.as_str()));
                }
            }
            None => {
                if !default_used && slots.has_default() {
                    default_used = true;
                    replacements.push((element.outer.clone(), slots.default.as_str()));
                }
            }
        }
    }

    let mut out = template.to_string();
    for (range, value) in replacements.into_iter().rev() {
        out = html::splice(&out, range, value);
    }
    out
}

/// Replace every remaining placeholder with its own fallback content.
pub fn finalize_slots(html: &str) -> String {
    let mut out = html.to_string();
    loop {
        let slots: Vec<Element> = html::parse_elements(&out)
            .into_iter()
            .filter(|e| e.name == SLOT_TAG)
            .collect();
        if slots.is_empty() {
            return out;
        }
        // Outermost placeholders only; nested ones surface on the next round.
        let outermost: Vec<&Element> = slots
            .iter()
            .filter(|e| !slots.iter().any(|other| other.contains(e)))
            .collect();
        for element in outermost.into_iter().rev() {
            let fallback = element.inner_html(&out).to_string();
            out = html::splice(&out, element.outer.clone(), &fallback);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_splits_default_and_named() {
        let slots = SlotContent::partition(
            "<h2 data-target=\"title\">Hi</h2><p>body</p><template data-target=\"footer\"><em>f</em></template>",
        );
        assert_eq!(slots.named["title"], "<h2>Hi</h2>");
        assert_eq!(slots.named["footer"], "<em>f</em>");
        assert_eq!(slots.default, "<p>body</p>");
    }

    #[test]
    fn duplicate_target_last_wins() {
        let slots = SlotContent::partition(
            "<template data-target=\"x\">one</template><template data-target=\"x\">two</template>",
        );
        assert_eq!(slots.named["x"], "two");
        assert!(!slots.has_default());
    }

    #[test]
    fn nested_targets_belong_to_their_parent() {
        let slots = SlotContent::partition("<div><span data-target=\"x\">a</span></div>");
        assert!(slots.named.is_empty());
        assert!(slots.has_default());
    }

    #[test]
    fn inject_fills_first_matching_placeholders_only() {
        let template = "<slot name=\"a\">fa</slot><slot>fd</slot><slot name=\"a\">again</slot><slot>d2</slot>";
        let slots = SlotContent::partition("<template data-target=\"a\">A</template>D");
        let out = inject(template, &slots);
        assert_eq!(out, "AD<slot name=\"a\">again</slot><slot>d2</slot>");
    }

    #[test]
    fn unfilled_placeholders_survive_injection() {
        let template = "<header><slot name=\"title\">Default title</slot></header><slot></slot>";
        let slots = SlotContent::partition("<p>main</p>");
        let out = inject(template, &slots);
        assert_eq!(
            out,
            "<header><slot name=\"title\">Default title</slot></header><p>main</p>"
        );
        assert_eq!(
            finalize_slots(&out),
            "<header>Default title</header><p>main</p>"
        );
    }

    #[test]
    fn finalize_unwraps_nested_fallbacks() {
        let html = "<slot name=\"a\">x<slot name=\"b\">y</slot>z</slot>";
        assert_eq!(finalize_slots(html), "xyz");
    }

    #[test]
    fn whitespace_only_default_does_not_fill() {
        let slots = SlotContent::partition("  \n ");
        assert_eq!(inject("<slot>fallback</slot>", &slots), "<slot>fallback</slot>");
    }
}
