//! `<head>` merging
//!
//! Head content contributed by pages and import callers is merged into the
//! host document's `<head>` element by element. Each element gets a
//! deduplication key made of its tag type and identifying attribute:
//!
//! | element                      | key                   | on conflict        |
//! |------------------------------|-----------------------|--------------------|
//! | `<title>`, `<base>`          | tag                   | incoming replaces  |
//! | `<meta name/property/...>`   | tag + attribute value | incoming replaces  |
//! | `<link rel=stylesheet href>` | href                  | first kept         |
//! | `<script src>`               | src                   | first kept         |
//! | inline `<script>`, `<style>` | none                  | always appended    |
//! | anything else                | normalized markup     | incoming replaces  |

use super::html::{self, Element, Token};

/// Identity of a head element for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HeadKey {
    Title,
    Base,
    Meta { attr: String, value: String },
    Stylesheet(String),
    ScriptSrc(String),
    Link { rel: String, href: String },
    Markup(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    IncomingWins,
    FirstWins,
    NeverDeduplicate,
}

/// A top-level node of a `<head>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadElement {
    html: String,
    key: Option<HeadKey>,
    policy: Policy,
}

impl HeadElement {
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn key(&self) -> Option<&HeadKey> {
        self.key.as_ref()
    }

    fn from_element(src: &str, element: &Element) -> Self {
        let html = element.outer_html(src).trim().to_string();
        let (key, policy) = classify(element, &html);
        Self { html, key, policy }
    }

    fn from_comment(text: &str) -> Self {
        let html = text.trim().to_string();
        Self {
            key: Some(HeadKey::Markup(collapse_whitespace(&html))),
            html,
            policy: Policy::IncomingWins,
        }
    }
}

fn classify(element: &Element, html: &str) -> (Option<HeadKey>, Policy) {
    let lower = |v: &str| v.trim().to_ascii_lowercase();
    match element.name.as_str() {
        "title" => (Some(HeadKey::Title), Policy::IncomingWins),
        "base" => (Some(HeadKey::Base), Policy::IncomingWins),
        "meta" => {
            if element.has_attr("charset") {
                return (
                    Some(HeadKey::Meta {
                        attr: "charset".to_string(),
                        value: String::new(),
                    }),
                    Policy::IncomingWins,
                );
            }
            for attr in ["name", "property", "http-equiv", "itemprop"] {
                if let Some(value) = element.attr(attr) {
                    return (
                        Some(HeadKey::Meta {
                            attr: attr.to_string(),
                            value: lower(value),
                        }),
                        Policy::IncomingWins,
                    );
                }
            }
            markup_key(html)
        }
        "link" => {
            let rel = element.attr("rel").map(lower).unwrap_or_default();
            let href = element.attr("href").map(|h| h.trim().to_string());
            match href {
                Some(href) if rel.split_whitespace().any(|r| r == "stylesheet") => {
                    (Some(HeadKey::Stylesheet(href)), Policy::FirstWins)
                }
                // One canonical URL and one icon/manifest per document.
                Some(_) if matches!(rel.as_str(), "canonical" | "icon" | "shortcut icon" | "manifest") => (
                    Some(HeadKey::Link {
                        rel,
                        href: String::new(),
                    }),
                    Policy::IncomingWins,
                ),
                Some(href) => (Some(HeadKey::Link { rel, href }), Policy::IncomingWins),
                None => markup_key(html),
            }
        }
        "script" => match element.attr("src") {
            Some(src) => (
                Some(HeadKey::ScriptSrc(src.trim().to_string())),
                Policy::FirstWins,
            ),
            None => (None, Policy::NeverDeduplicate),
        },
        "style" => (None, Policy::NeverDeduplicate),
        _ => markup_key(html),
    }
}

fn markup_key(html: &str) -> (Option<HeadKey>, Policy) {
    (
        Some(HeadKey::Markup(collapse_whitespace(html))),
        Policy::IncomingWins,
    )
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse the top-level elements (and comments) of head markup.
pub fn parse_head_elements(head_inner: &str) -> Vec<HeadElement> {
    let tops = html::top_level_elements(head_inner);
    let mut nodes: Vec<(usize, HeadElement)> = tops
        .iter()
        .map(|e| (e.outer.start, HeadElement::from_element(head_inner, e)))
        .collect();

    for token in html::tokenize(head_inner) {
        if let Token::Comment(span) = token {
            let nested = tops
                .iter()
                .any(|e| span.start > e.outer.start && span.start < e.outer.end);
            if !nested {
                nodes.push((span.start, HeadElement::from_comment(&head_inner[span])));
            }
        }
    }

    nodes.sort_by_key(|(start, _)| *start);
    nodes.into_iter().map(|(_, el)| el).collect()
}

/// Ordered, deduplicated head content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadSet {
    entries: Vec<HeadElement>,
}

impl HeadSet {
    pub fn parse(head_inner: &str) -> Self {
        let mut set = Self::default();
        set.merge(parse_head_elements(head_inner));
        set
    }

    /// Merge `incoming` into the set; incoming entries win ties except
    /// script/stylesheet references, where the entry already present stays.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = HeadElement>) {
        for element in incoming {
            let Some(key) = element.key.clone() else {
                self.entries.push(element);
                continue;
            };
            match self
                .entries
                .iter()
                .position(|e| e.key.as_ref() == Some(&key))
            {
                Some(idx) => {
                    if element.policy == Policy::IncomingWins {
                        self.entries[idx] = element;
                    }
                }
                None => self.entries.push(element),
            }
        }
    }

    pub fn entries(&self) -> &[HeadElement] {
        &self.entries
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.html.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Outcome of merging into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadMerge {
    /// Merged into the document's `<head>`; carries the resulting document
    Merged(String),
    /// The document has no `<head>` (and no `<html>` to create one in)
    NoHead,
}

/// Merge `incoming` into the `<head>` of `document`. A document with an
/// `<html>` element but no `<head>` gets one.
pub fn merge_into_document(document: &str, incoming: &[HeadElement]) -> HeadMerge {
    if let Some(head) = html::find_tag(document, "head") {
        let mut set = HeadSet::parse(head.inner_html(document));
        set.merge(incoming.iter().cloned());
        let body = format!("\n{}\n", set.render());
        return HeadMerge::Merged(html::splice(document, head.inner, &body));
    }

    if let Some(root) = html::find_tag(document, "html") {
        let mut set = HeadSet::default();
        set.merge(incoming.iter().cloned());
        let open_end = root.inner.start;
        let head = format!("\n<head>\n{}\n</head>", set.render());
        return HeadMerge::Merged(html::splice(document, open_end..open_end, &head));
    }

    HeadMerge::NoHead
}
