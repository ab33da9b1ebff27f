use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, ParseOpts, QualName, ns, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::capture::sanitize::{HtmlSanitizer, MarkupNode, SanitizePolicy};

/// Deny-list sanitizer built on the html5ever parser.
///
/// Markup is parsed as a fragment, forbidden elements are dropped together
/// with their content, and forbidden or inline event-handler attributes are
/// removed before the tree is serialized again. A copied subtree keeps its
/// root: only the children are reparsed, in the root's own context, so
/// `body`, `html` and table parts are not relocated by the tree builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicySanitizer;

impl HtmlSanitizer for PolicySanitizer {
    fn sanitize(&self, html: &str, policy: &SanitizePolicy) -> String {
        clean_fragment(html, "body", policy).iter().map(MarkupNode::to_html).collect()
    }

    fn sanitize_markup(&self, root: &MarkupNode, policy: &SanitizePolicy) -> String {
        let MarkupNode::Element { tag, attributes, .. } = root else {
            return self.sanitize(&root.to_html(), policy);
        };
        if policy.forbids_tag(tag) {
            return String::new();
        }

        MarkupNode::Element {
            tag: tag.clone(),
            attributes: attributes
                .iter()
                .filter(|(name, _)| is_allowed_attribute(name, policy))
                .cloned()
                .collect(),
            children: clean_fragment(&root.inner_html(), tag, policy),
        }
        .to_html()
    }
}

fn context_name(tag: &str) -> QualName {
    let namespace = match tag {
        "svg" => ns!(svg),
        "math" => ns!(mathml),
        _ => ns!(html),
    };
    QualName::new(None, namespace, LocalName::from(tag))
}

/// Parse `markup` as the content of a `context` element and clean every
/// top-level node
fn clean_fragment(markup: &str, context: &str, policy: &SanitizePolicy) -> Vec<MarkupNode> {
    if markup.is_empty() {
        return Vec::new();
    }

    let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context_name(context), Vec::new(), false)
        .one(markup);

    // The fragment parser roots its output in a synthetic `html` element
    let roots = dom.document.children.borrow();
    let Some(root) = roots.first() else {
        return Vec::new();
    };
    root.children
        .borrow()
        .iter()
        .filter_map(|child| clean_node(child, policy))
        .collect()
}

fn clean_node(handle: &Handle, policy: &SanitizePolicy) -> Option<MarkupNode> {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.to_string();
            if policy.forbids_tag(&tag) {
                return None;
            }
            let attributes = attrs
                .borrow()
                .iter()
                .map(|attr| {
                    let name = match &attr.name.prefix {
                        Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                        None => attr.name.local.to_string(),
                    };
                    (name, attr.value.to_string())
                })
                .filter(|(name, _)| is_allowed_attribute(name, policy))
                .collect();
            let children = handle
                .children
                .borrow()
                .iter()
                .filter_map(|child| clean_node(child, policy))
                .collect();
            Some(MarkupNode::Element { tag, attributes, children })
        }
        NodeData::Text { contents } => Some(MarkupNode::Text(contents.borrow().to_string())),
        // Comments, doctypes and processing instructions are dropped
        _ => None,
    }
}

fn is_allowed_attribute(name: &str, policy: &SanitizePolicy) -> bool {
    !policy.forbids_attribute(name) && !is_event_handler(name)
}

fn is_event_handler(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.len() > 2 && lower.starts_with("on") && lower[2..].bytes().all(|b| b.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::sanitize::Sanitizer;
    use crate::capture::snapshot::PageElement;

    fn sanitize(html: &str) -> String {
        PolicySanitizer.sanitize(html, &SanitizePolicy::default())
    }

    #[test]
    fn test_drops_forbidden_tags_with_content() {
        let out = sanitize("<div><script>alert(1)</script><p>Hi</p><iframe src=\"x\"></iframe></div>");
        assert_eq!(out, "<div><p>Hi</p></div>");
    }

    #[test]
    fn test_drops_event_handlers() {
        let out = sanitize("<img src=\"a.png\" onerror=\"alert(1)\" onfocus=\"x()\" alt=\"A\">");
        assert_eq!(out, "<img src=\"a.png\" alt=\"A\">");
    }

    #[test]
    fn test_keeps_regular_markup() {
        let out = sanitize("<section class=\"hero\" data-id=\"7\">Tom &amp; Jerry</section>");
        assert_eq!(out, "<section class=\"hero\" data-id=\"7\">Tom &amp; Jerry</section>");
    }

    #[test]
    fn test_custom_policy() {
        let policy = SanitizePolicy {
            forbid_tags: vec!["em".into()],
            forbid_attrs: vec!["title".into()],
        };
        let out = PolicySanitizer.sanitize("<p title=\"t\">a<em>b</em></p>", &policy);
        assert_eq!(out, "<p>a</p>");
    }

    fn sanitize_root(root: &PageElement) -> String {
        Sanitizer::new(PolicySanitizer).sanitize_element(root)
    }

    #[test]
    fn test_body_root_is_kept() {
        let root = PageElement::new("body")
            .with_attribute("data-id", "page")
            .with_attribute("onload", "boot()")
            .with_child(PageElement::new("p").with_text("x"));

        assert_eq!(sanitize_root(&root), "<body data-id=\"page\"><p>x</p></body>");
    }

    #[test]
    fn test_table_roots_are_kept() {
        let cell = PageElement::new("td").with_attribute("data-id", "cell").with_text("v");
        assert_eq!(sanitize_root(&cell), "<td data-id=\"cell\">v</td>");

        let row = PageElement::new("tr")
            .with_attribute("data-id", "row")
            .with_child(PageElement::new("td").with_text("a"))
            .with_child(PageElement::new("script").with_text("x()"));
        assert_eq!(sanitize_root(&row), "<tr data-id=\"row\"><td>a</td></tr>");
    }

    #[test]
    fn test_html_root_keeps_body_attributes() {
        let root = PageElement::new("html").with_attribute("lang", "en").with_child(
            PageElement::new("body")
                .with_attribute("data-id", "b")
                .with_child(PageElement::new("p").with_text("x")),
        );

        let out = sanitize_root(&root);
        assert!(out.starts_with("<html lang=\"en\">"));
        assert!(out.contains("<body data-id=\"b\"><p>x</p></body>"));
    }

    #[test]
    fn test_forbidden_root_yields_nothing() {
        assert_eq!(sanitize_root(&PageElement::new("iframe").with_text("x")), "");
    }

    #[test]
    fn test_style_root_text_is_not_escaped_twice() {
        let root = PageElement::new("style").with_text("a > b { color: red }");
        assert_eq!(sanitize_root(&root), "<style>a > b { color: red }</style>");
    }
}
