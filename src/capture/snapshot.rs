use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::capture::document::{BoundingBox, StyleMap, Viewport};
use crate::capture::sanitize::MarkupNode;
use crate::capture::{CaptureHost, LiveElement, LiveNode, PseudoElement};

/// An element read out of a live page, with its computed styles and geometry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    pub tag_name: String,

    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    #[serde(default)]
    pub styles: StyleMap,

    #[serde(default)]
    pub before: StyleMap,

    #[serde(default)]
    pub after: StyleMap,

    #[serde(default)]
    pub rect: BoundingBox,

    #[serde(default)]
    pub nodes: Vec<PageNode>,

    /// Markup reported by the page for `svg` elements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_html: Option<String>,

    #[serde(default)]
    pub shadow_root: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_src: Option<String>,

    #[serde(default)]
    pub natural_width: f64,

    #[serde(default)]
    pub natural_height: f64,
}

/// Child of a [`PageElement`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageNode {
    Element(PageElement),
    Text { text: String },
}

impl PageElement {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self { tag_name: tag_name.into(), ..Default::default() }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(property.into(), value.into());
        self
    }

    pub fn with_before(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.before.insert(property.into(), value.into());
        self
    }

    pub fn with_after(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.after.insert(property.into(), value.into());
        self
    }

    pub fn with_rect(mut self, rect: BoundingBox) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_child(mut self, child: PageElement) -> Self {
        self.nodes.push(PageNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.nodes.push(PageNode::Text { text: text.into() });
        self
    }

    pub fn with_outer_html(mut self, markup: impl Into<String>) -> Self {
        self.outer_html = Some(markup.into());
        self
    }

    pub fn with_shadow_root(mut self, shadow_root: bool) -> Self {
        self.shadow_root = shadow_root;
        self
    }
}

impl LiveElement for PageElement {
    fn tag_name(&self) -> &str {
        &self.tag_name
    }

    fn attributes(&self) -> Vec<(&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    fn child_nodes(&self) -> Vec<LiveNode<'_, Self>> {
        self.nodes
            .iter()
            .map(|node| match node {
                PageNode::Element(element) => LiveNode::Element(element),
                PageNode::Text { text } => LiveNode::Text(text.as_str()),
            })
            .collect()
    }

    fn outer_html(&self) -> String {
        self.outer_html
            .clone()
            .unwrap_or_else(|| MarkupNode::from_live(self).to_html())
    }

    fn has_shadow_root(&self) -> bool {
        self.shadow_root
    }

    fn current_src(&self) -> Option<&str> {
        self.current_src
            .as_deref()
            .or_else(|| self.attributes.get("src").map(String::as_str))
    }

    fn natural_size(&self) -> (f64, f64) {
        (self.natural_width, self.natural_height)
    }
}

/// A page read in one pass: the chosen subtree plus page-level facts.
///
/// Serves as the capture host for its own elements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageSnapshot {
    pub url: String,
    pub viewport: Viewport,
    pub root: PageElement,

    /// Text of elements referenced by `aria-labelledby`/`aria-describedby`
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, viewport: Viewport, root: PageElement) -> Self {
        Self { url: url.into(), viewport, root, labels: HashMap::new() }
    }
}

impl CaptureHost for PageSnapshot {
    type Element = PageElement;

    fn computed_style(&self, element: &PageElement, pseudo: Option<PseudoElement>) -> StyleMap {
        match pseudo {
            None => element.styles.clone(),
            Some(PseudoElement::Before) => element.before.clone(),
            Some(PseudoElement::After) => element.after.clone(),
        }
    }

    fn bounding_rect(&self, element: &PageElement) -> BoundingBox {
        element.rect
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn current_url(&self) -> String {
        self.url.clone()
    }

    fn text_by_id(&self, id: &str) -> Option<String> {
        self.labels.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_page_snapshot() {
        let json = r#"{
            "url": "https://example.com/",
            "viewport": {"width": 800, "height": 600},
            "root": {
                "tagName": "DIV",
                "attributes": {"id": "main", "class": "card"},
                "styles": {"display": "block", "color": "rgb(0, 0, 0)"},
                "rect": {"x": 1, "y": 2, "width": 3, "height": 4},
                "shadowRoot": false,
                "nodes": [
                    {"kind": "text", "text": "Hello"},
                    {"kind": "element", "tagName": "IMG", "currentSrc": "https://example.com/a.png"}
                ]
            },
            "labels": {"t": "Title"}
        }"#;

        let snapshot: PageSnapshot = serde_json::from_str(json).unwrap();
        let root = &snapshot.root;

        assert_eq!(root.attribute("ID"), Some("main"));
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].current_src(), Some("https://example.com/a.png"));
        assert_eq!(snapshot.bounding_rect(root), BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(snapshot.text_by_id("t").as_deref(), Some("Title"));

        let style = snapshot.computed_style(root, None);
        let keys: Vec<&String> = style.keys().collect();
        assert_eq!(keys, vec!["display", "color"]);
    }

    #[test]
    fn test_outer_html_falls_back_to_markup() {
        let element = PageElement::new("span").with_attribute("class", "x").with_text("hi");
        assert_eq!(element.outer_html(), "<span class=\"x\">hi</span>");

        let svg = PageElement::new("svg").with_outer_html("<svg></svg>");
        assert_eq!(svg.outer_html(), "<svg></svg>");
    }
}
