//! HTML token stream
//!
//! A small, lenient scanner that turns markup into start/end/text tokens with
//! byte spans, and an element index built from those tokens with an explicit
//! open-element stack. Nested elements with the same tag name are matched by
//! depth, never by pattern search.
//!
//! The scanner does not build a DOM and never fails: malformed markup degrades
//! to text, and unclosed elements run to the end of the input.

use std::ops::Range;

/// Elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name
    pub name: String,
    /// Unquoted value; `None` for bare attributes such as `async`
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        attrs: Vec<Attribute>,
        self_closing: bool,
        span: Range<usize>,
    },
    EndTag {
        name: String,
        span: Range<usize>,
    },
    Text(Range<usize>),
    Comment(Range<usize>),
    /// `<!DOCTYPE ...>`, `<?...?>` and other declarations
    Declaration(Range<usize>),
}

impl Token {
    pub fn span(&self) -> Range<usize> {
        match self {
            Token::StartTag { span, .. } | Token::EndTag { span, .. } => span.clone(),
            Token::Text(span) | Token::Comment(span) | Token::Declaration(span) => span.clone(),
        }
    }
}

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Scan `html` into tokens covering the whole input in order.
pub fn tokenize(html: &str) -> Vec<Token> {
    Tokenizer::new(html).run()
}

struct Tokenizer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    text_start: Option<usize>,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            text_start: None,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'<' {
                if let Some(token) = self.markup_at(self.pos) {
                    self.flush_text(self.pos);
                    let end = token.span().end;
                    let raw_text_name = match &token {
                        Token::StartTag {
                            name, self_closing, ..
                        } if !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str()) => {
                            Some(name.clone())
                        }
                        _ => None,
                    };
                    self.tokens.push(token);
                    self.pos = end;
                    if let Some(name) = raw_text_name {
                        self.skip_raw_text(&name);
                    }
                    continue;
                }
            }
            if self.text_start.is_none() {
                self.text_start = Some(self.pos);
            }
            self.pos += 1;
        }
        self.flush_text(self.bytes.len());
        self.tokens
    }

    fn flush_text(&mut self, end: usize) {
        if let Some(start) = self.text_start.take() {
            if start < end {
                self.tokens.push(Token::Text(start..end));
            }
        }
    }

    /// Emit the body of a raw text element as a single text token.
    fn skip_raw_text(&mut self, name: &str) {
        let close = format!("</{}", name);
        let rest = &self.src[self.pos..];
        let found = find_ascii_case_insensitive(rest, &close).map(|i| self.pos + i);
        let end = found.unwrap_or(self.bytes.len());
        if self.pos < end {
            self.tokens.push(Token::Text(self.pos..end));
        }
        self.pos = end;
    }

    fn markup_at(&self, start: usize) -> Option<Token> {
        let rest = &self.src[start..];
        if rest.starts_with("<!--") {
            let end = rest[4..]
                .find("-->")
                .map(|i| start + 4 + i + 3)
                .unwrap_or(self.bytes.len());
            return Some(Token::Comment(start..end));
        }
        let next = *self.bytes.get(start + 1)?;
        if next == b'!' || next == b'?' {
            let end = rest.find('>').map(|i| start + i + 1)?;
            return Some(Token::Declaration(start..end));
        }
        if next == b'/' {
            let first = *self.bytes.get(start + 2)?;
            if !first.is_ascii_alphabetic() {
                return None;
            }
            let (name, after_name) = self.read_name(start + 2);
            let close = self.src[after_name..].find('>')? + after_name + 1;
            return Some(Token::EndTag {
                name,
                span: start..close,
            });
        }
        if next.is_ascii_alphabetic() {
            return self.start_tag(start);
        }
        None
    }

    fn read_name(&self, from: usize) -> (String, usize) {
        let mut end = from;
        while end < self.bytes.len() {
            let b = self.bytes[end];
            if b.is_ascii_whitespace() || b == b'>' || b == b'/' {
                break;
            }
            end += 1;
        }
        (self.src[from..end].to_ascii_lowercase(), end)
    }

    fn start_tag(&self, start: usize) -> Option<Token> {
        let (name, mut i) = self.read_name(start + 1);
        let mut attrs = Vec::new();
        let len = self.bytes.len();

        loop {
            while i < len && self.bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= len {
                return None;
            }
            match self.bytes[i] {
                b'>' => {
                    return Some(Token::StartTag {
                        name,
                        attrs,
                        self_closing: false,
                        span: start..i + 1,
                    });
                }
                b'/' if self.bytes.get(i + 1) == Some(&b'>') => {
                    return Some(Token::StartTag {
                        name,
                        attrs,
                        self_closing: true,
                        span: start..i + 2,
                    });
                }
                b'/' => {
                    i += 1;
                    continue;
                }
                _ => {}
            }

            let name_start = i;
            while i < len {
                let b = self.bytes[i];
                if b.is_ascii_whitespace() || b == b'=' || b == b'>' || b == b'/' {
                    break;
                }
                i += 1;
            }
            let attr_name = self.src[name_start..i].to_ascii_lowercase();

            let mut j = i;
            while j < len && self.bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < len && self.bytes[j] == b'=' {
                j += 1;
                while j < len && self.bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                if j >= len {
                    return None;
                }
                let quote = self.bytes[j];
                let value = if quote == b'"' || quote == b'\'' {
                    let value_start = j + 1;
                    let close = self.bytes[value_start..]
                        .iter()
                        .position(|&b| b == quote)
                        .map(|p| value_start + p)?;
                    i = close + 1;
                    &self.src[value_start..close]
                } else {
                    let value_start = j;
                    while j < len && !self.bytes[j].is_ascii_whitespace() && self.bytes[j] != b'>'
                    {
                        j += 1;
                    }
                    i = j;
                    &self.src[value_start..j]
                };
                attrs.push(Attribute {
                    name: attr_name,
                    value: Some(value.to_string()),
                });
            } else {
                attrs.push(Attribute {
                    name: attr_name,
                    value: None,
                });
            }
        }
    }
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

/// An element located in a document, with byte ranges into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<Attribute>,
    /// From `<` of the start tag to `>` of the end tag (or end of input)
    pub outer: Range<usize>,
    /// Content between the tags; empty for void and self-closing elements
    pub inner: Range<usize>,
    /// Number of open ancestors
    pub depth: usize,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    pub fn outer_html<'s>(&self, src: &'s str) -> &'s str {
        &src[self.outer.clone()]
    }

    pub fn inner_html<'s>(&self, src: &'s str) -> &'s str {
        &src[self.inner.clone()]
    }

    /// Whether `other` lies inside this element.
    pub fn contains(&self, other: &Element) -> bool {
        other.outer.start > self.outer.start && other.outer.end <= self.outer.end
    }
}

/// Index every element of `html` in document order of their start tags.
pub fn parse_elements(html: &str) -> Vec<Element> {
    let mut elements: Vec<Element> = Vec::new();
    // Indices into `elements` of currently open elements.
    let mut stack: Vec<usize> = Vec::new();

    for token in tokenize(html) {
        match token {
            Token::StartTag {
                name,
                attrs,
                self_closing,
                span,
            } => {
                let depth = stack.len();
                if self_closing || is_void_element(&name) {
                    elements.push(Element {
                        name,
                        attrs,
                        outer: span.clone(),
                        inner: span.end..span.end,
                        depth,
                    });
                } else {
                    elements.push(Element {
                        name,
                        attrs,
                        outer: span.start..html.len(),
                        inner: span.end..html.len(),
                        depth,
                    });
                    stack.push(elements.len() - 1);
                }
            }
            Token::EndTag { name, span } => {
                let Some(pos) = stack.iter().rposition(|&idx| elements[idx].name == name) else {
                    continue;
                };
                // Anything opened after the match is closed implicitly here.
                for &idx in &stack[pos + 1..] {
                    elements[idx].outer.end = span.start;
                    elements[idx].inner.end = span.start;
                }
                let idx = stack[pos];
                elements[idx].inner.end = span.start;
                elements[idx].outer.end = span.end;
                stack.truncate(pos);
            }
            Token::Text(_) | Token::Comment(_) | Token::Declaration(_) => {}
        }
    }
    elements
}

/// First element in document order satisfying `pred`.
pub fn find_element(html: &str, pred: impl Fn(&Element) -> bool) -> Option<Element> {
    parse_elements(html).into_iter().find(|e| pred(e))
}

/// First element with the given tag name.
pub fn find_tag(html: &str, name: &str) -> Option<Element> {
    find_element(html, |e| e.name == name)
}

/// Elements not nested inside any other element.
pub fn top_level_elements(html: &str) -> Vec<Element> {
    parse_elements(html)
        .into_iter()
        .filter(|e| e.depth == 0)
        .collect()
}

/// Replace `range` of `src` with `replacement`.
pub fn splice(src: &str, range: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(src.len() - range.len() + replacement.len());
    out.push_str(&src[..range.start]);
    out.push_str(replacement);
    out.push_str(&src[range.end..]);
    out
}

/// Render a start tag from its parts. Values are double-quoted.
pub fn render_start_tag(name: &str, attrs: &[Attribute], self_closing: bool) -> String {
    let mut out = format!("<{}", name);
    for attr in attrs {
        out.push(' ');
        out.push_str(&attr.name);
        if let Some(value) = &attr.value {
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }
    }
    out.push_str(if self_closing { " />" } else { ">" });
    out
}

/// Remove `attr` from every start tag in `src` that carries it. Tags without
/// the attribute are left byte-for-byte untouched.
pub fn strip_attribute(src: &str, attr: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    for token in tokenize(src) {
        let Token::StartTag {
            name,
            attrs,
            self_closing,
            span,
        } = token
        else {
            continue;
        };
        if !attrs.iter().any(|a| a.name == attr) {
            continue;
        }
        let kept: Vec<Attribute> = attrs.into_iter().filter(|a| a.name != attr).collect();
        out.push_str(&src[last..span.start]);
        out.push_str(&render_start_tag(&name, &kept, self_closing));
        last = span.end;
    }
    out.push_str(&src[last..]);
    out
}

pub fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Escape text content.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Make arbitrary text safe to place inside an HTML comment.
pub fn comment_safe(text: &str) -> String {
    text.replace("--", "- -").replace('>', "&gt;")
}
