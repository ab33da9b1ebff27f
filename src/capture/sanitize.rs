use crate::capture::{LiveElement, LiveNode};

/// Tags the sanitization backend must drop
pub const FORBIDDEN_TAGS: [&str; 4] = ["script", "iframe", "object", "embed"];

/// Attributes the sanitization backend must drop
pub const FORBIDDEN_ATTRIBUTES: [&str; 4] = ["onerror", "onload", "onclick", "onmouseover"];

/// Attribute name prefixes likely to carry tokens, credentials or PII
const SENSITIVE_ATTRIBUTE_PREFIXES: [&str; 7] = [
    "data-token",
    "data-key",
    "data-secret",
    "data-password",
    "data-cpf",
    "data-card",
    "data-auth",
];

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

/// Case-insensitive prefix match against the sensitive attribute patterns
pub fn is_sensitive_attribute(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    SENSITIVE_ATTRIBUTE_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Tag and attribute deny lists handed to the sanitization backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizePolicy {
    pub forbid_tags: Vec<String>,
    pub forbid_attrs: Vec<String>,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self {
            forbid_tags: FORBIDDEN_TAGS.iter().map(|tag| tag.to_string()).collect(),
            forbid_attrs: FORBIDDEN_ATTRIBUTES.iter().map(|attr| attr.to_string()).collect(),
        }
    }
}

impl SanitizePolicy {
    pub fn forbids_tag(&self, tag: &str) -> bool {
        self.forbid_tags.iter().any(|forbidden| forbidden.eq_ignore_ascii_case(tag))
    }

    pub fn forbids_attribute(&self, name: &str) -> bool {
        self.forbid_attrs.iter().any(|forbidden| forbidden.eq_ignore_ascii_case(name))
    }
}

/// An HTML sanitization library: `sanitize(html, policy) -> html`
pub trait HtmlSanitizer {
    fn sanitize(&self, html: &str, policy: &SanitizePolicy) -> String;

    /// Sanitize an already-copied subtree.
    ///
    /// The default serializes `root` and hands the markup to [`sanitize`](Self::sanitize).
    /// Backends that reparse should override this so roots a parser would
    /// relocate (`body`, `html`, table parts) survive.
    fn sanitize_markup(&self, root: &MarkupNode, policy: &SanitizePolicy) -> String {
        self.sanitize(&root.to_html(), policy)
    }
}

impl<F> HtmlSanitizer for F
where
    F: Fn(&str, &SanitizePolicy) -> String,
{
    fn sanitize(&self, html: &str, policy: &SanitizePolicy) -> String {
        self(html, policy)
    }
}

/// Owned deep copy of a markup subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<MarkupNode>,
    },
    Text(String),
}

impl MarkupNode {
    pub fn element(tag: impl Into<String>) -> Self {
        Self::Element { tag: tag.into(), attributes: Vec::new(), children: Vec::new() }
    }

    /// Copy a live element and everything below it
    pub fn from_live<E: LiveElement>(element: &E) -> Self {
        Self::Element {
            tag: element.tag_name().to_lowercase(),
            attributes: element
                .attributes()
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            children: element
                .child_nodes()
                .into_iter()
                .map(|node| match node {
                    LiveNode::Element(child) => Self::from_live(child),
                    LiveNode::Text(text) => Self::Text(text.to_string()),
                })
                .collect(),
        }
    }

    /// Remove sensitive attributes from this node and every descendant
    pub fn strip_sensitive_attributes(&mut self) {
        if let Self::Element { attributes, children, .. } = self {
            attributes.retain(|(name, _)| !is_sensitive_attribute(name));
            for child in children {
                child.strip_sensitive_attributes();
            }
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out, false);
        out
    }

    /// Markup of the children only; empty for text nodes
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        if let Self::Element { tag, children, .. } = self {
            let raw = is_raw_text(tag);
            for child in children {
                child.write_html(&mut out, raw);
            }
        }
        out
    }

    fn write_html(&self, out: &mut String, raw_text: bool) {
        match self {
            Self::Text(text) if raw_text => out.push_str(text),
            Self::Text(text) => escape_into(out, text, false),
            Self::Element { tag, attributes, children } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(out, value, true);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                let raw = is_raw_text(tag);
                for child in children {
                    child.write_html(out, raw);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn is_raw_text(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

/// Produces the sanitized audit copy of a captured subtree
pub struct Sanitizer<S: HtmlSanitizer> {
    backend: S,
    policy: SanitizePolicy,
}

impl<S: HtmlSanitizer> Sanitizer<S> {
    pub fn new(backend: S) -> Self {
        Self { backend, policy: SanitizePolicy::default() }
    }

    /// Sanitize a deep copy of `root`; the live element is never touched.
    ///
    /// Sensitive attributes are stripped before the markup is serialized,
    /// so their values never reach the backend. Residual script URLs and
    /// CSS `expression(` calls are removed from the backend's output.
    pub fn sanitize_element<E: LiveElement>(&self, root: &E) -> String {
        let mut copy = MarkupNode::from_live(root);
        copy.strip_sensitive_attributes();
        let cleaned = self.backend.sanitize_markup(&copy, &self.policy);
        strip_script_vectors(&cleaned)
    }
}

/// Remove `javascript:` schemes and turn `expression(` into `(`, ignoring
/// case and whitespace before the terminator, until none remain
pub fn strip_script_vectors(html: &str) -> String {
    let mut current = html.to_string();
    loop {
        let next = replace_keyword(&replace_keyword(&current, "javascript", b':', ""), "expression", b'(', "(");
        if next == current {
            return next;
        }
        current = next;
    }
}

fn replace_keyword(input: &str, keyword: &str, terminator: u8, replacement: &str) -> String {
    let bytes = input.as_bytes();
    let keyword = keyword.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes.len() - i >= keyword.len() && bytes[i..i + keyword.len()].eq_ignore_ascii_case(keyword) {
            let mut j = i + keyword.len();
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == terminator {
                out.extend_from_slice(replacement.as_bytes());
                i = j + 1;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    // Only ASCII spans were removed, so the output is still valid UTF-8
    String::from_utf8_lossy(&out).into_owned()
}
