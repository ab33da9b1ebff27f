use chrono::{SecondsFormat, Utc};
use rand::Rng;

use crate::capture::document::{
    AccessibilityData, CAPTURE_VERSION, CaptureDocument, CaptureElement, PseudoStyles,
};
use crate::capture::{CaptureHost, LiveElement, LiveNode, PseudoElement};
use crate::error::{PipelineError, Result};
use crate::mapping::style::is_svg_element;

/// Attributes whose presence makes an element carry accessibility metadata
const ACCESSIBILITY_ATTRIBUTES: [&str; 5] =
    ["role", "aria-label", "aria-labelledby", "aria-describedby", "aria-hidden"];

/// Walks a live subtree and produces a [`CaptureDocument`]
pub struct TreeCapturer<'h, H: CaptureHost> {
    host: &'h H,
}

impl<'h, H: CaptureHost> TreeCapturer<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Capture `root` into a new document.
    ///
    /// The element count is checked before the walk starts; the walk itself
    /// is unbounded.
    pub fn capture(&self, root: &H::Element, max_elements: usize) -> Result<CaptureDocument> {
        let count = count_live_elements(root);
        if count > max_elements {
            log::warn!("Refusing capture of {} elements (limit {})", count, max_elements);
            return Err(PipelineError::ElementLimitExceeded { count, limit: max_elements });
        }

        let element = self.build_element(root);
        log::debug!("Captured tree of {} elements", count);

        Ok(CaptureDocument {
            id: generate_capture_id(),
            version: CAPTURE_VERSION.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            url: self.host.current_url(),
            viewport: self.host.viewport(),
            element,
        })
    }

    /// Depth-first pre-order construction of one element and its subtree
    fn build_element(&self, element: &H::Element) -> CaptureElement {
        let tag_name = element.tag_name().to_lowercase();
        let is_svg = is_svg_element(&tag_name);

        let children = if is_svg {
            Vec::new()
        } else {
            element.children().into_iter().map(|child| self.build_element(child)).collect()
        };

        CaptureElement {
            id: element.attribute("id").unwrap_or_default().to_string(),
            styles: self.host.computed_style(element, None),
            pseudo: PseudoStyles {
                before: self.host.computed_style(element, Some(PseudoElement::Before)),
                after: self.host.computed_style(element, Some(PseudoElement::After)),
            },
            children,
            bounding_box: self.host.bounding_rect(element),
            svg_content: is_svg.then(|| element.outer_html()),
            accessibility: self.accessibility(element),
            text: if is_svg { None } else { direct_text(element) },
            src: if tag_name == "img" { element.current_src().map(str::to_string) } else { None },
            tag_name,
        }
    }

    fn accessibility(&self, element: &H::Element) -> Option<AccessibilityData> {
        if !ACCESSIBILITY_ATTRIBUTES.iter().any(|name| element.attribute(name).is_some()) {
            return None;
        }

        let label = element
            .attribute("aria-label")
            .map(str::to_string)
            .or_else(|| self.referenced_text(element.attribute("aria-labelledby")));

        AccessibilityData {
            role: element.attribute("role").map(str::to_string),
            label,
            description: self.referenced_text(element.attribute("aria-describedby")),
            hidden: element.attribute("aria-hidden").map(|value| value.trim() == "true"),
        }
        .non_empty()
    }

    /// Resolve a space-separated id list to the joined text of its targets
    fn referenced_text(&self, ids: Option<&str>) -> Option<String> {
        let text: Vec<String> = ids?
            .split_whitespace()
            .filter_map(|id| self.host.text_by_id(id))
            .filter(|text| !text.trim().is_empty())
            .collect();
        if text.is_empty() { None } else { Some(text.join(" ")) }
    }
}

/// Count an element and its descendants; `svg` elements count as one
pub fn count_live_elements<E: LiveElement>(root: &E) -> usize {
    if is_svg_element(root.tag_name()) {
        return 1;
    }
    1 + root.children().into_iter().map(count_live_elements).sum::<usize>()
}

fn direct_text<E: LiveElement>(element: &E) -> Option<String> {
    let parts: Vec<&str> = element
        .child_nodes()
        .into_iter()
        .filter_map(|node| match node {
            LiveNode::Text(text) => Some(text.trim()),
            LiveNode::Element(_) => None,
        })
        .filter(|text| !text.is_empty())
        .collect();
    if parts.is_empty() { None } else { Some(parts.join(" ")) }
}

/// `capture_<unix millis>_<7 base-36 characters>`
fn generate_capture_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..7)
        .filter_map(|_| std::char::from_digit(rng.gen_range(0..36), 36))
        .collect();
    format!("capture_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::document::{BoundingBox, Viewport};
    use crate::capture::snapshot::{PageElement, PageSnapshot};

    fn snapshot(root: PageElement) -> PageSnapshot {
        PageSnapshot::new("https://example.com/", Viewport::new(1024.0, 768.0), root)
    }

    #[test]
    fn test_capture_document_metadata() {
        let page = snapshot(PageElement::new("DIV").with_attribute("id", "root"));
        let doc = TreeCapturer::new(&page).capture(&page.root, 100).unwrap();

        assert_eq!(doc.version, "1.0");
        assert_eq!(doc.url, "https://example.com/");
        assert_eq!(doc.viewport, Viewport::new(1024.0, 768.0));
        assert!(doc.id.starts_with("capture_"));
        assert!(doc.timestamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&doc.timestamp).is_ok());
        assert_eq!(doc.element.tag_name, "div");
        assert_eq!(doc.element.id, "root");
    }

    #[test]
    fn test_capture_preserves_order_styles_and_geometry() {
        let root = PageElement::new("ul")
            .with_style("display", "flex")
            .with_style("color", "rgb(0, 0, 0)")
            .with_before("content", "\"*\"")
            .with_rect(BoundingBox::new(0.0, 0.0, 300.0, 100.0))
            .with_child(PageElement::new("li").with_text("one"))
            .with_child(PageElement::new("li").with_text("  two  "));
        let page = snapshot(root);
        let doc = TreeCapturer::new(&page).capture(&page.root, 100).unwrap();

        let keys: Vec<&String> = doc.element.styles.keys().collect();
        assert_eq!(keys, vec!["display", "color"]);
        assert_eq!(doc.element.pseudo.before.get("content").map(String::as_str), Some("\"*\""));
        assert!(doc.element.pseudo.after.is_empty());
        assert_eq!(doc.element.bounding_box.width, 300.0);
        assert_eq!(doc.element.children[0].text.as_deref(), Some("one"));
        assert_eq!(doc.element.children[1].text.as_deref(), Some("two"));
        assert!(doc.element.text.is_none());
    }

    #[test]
    fn test_svg_is_a_leaf() {
        let svg = PageElement::new("svg")
            .with_attribute("viewBox", "0 0 10 10")
            .with_outer_html("<svg viewBox=\"0 0 10 10\"><path d=\"M0 0\"></path></svg>")
            .with_child(PageElement::new("path"));
        let page = snapshot(PageElement::new("div").with_child(svg));
        let doc = TreeCapturer::new(&page).capture(&page.root, 100).unwrap();

        let svg = &doc.element.children[0];
        assert!(svg.children.is_empty());
        assert!(svg.svg_content.as_deref().unwrap().starts_with("<svg"));
        assert_eq!(doc.count_elements(), 2);
    }

    #[test]
    fn test_accessibility_extraction() {
        let mut page = snapshot(
            PageElement::new("div")
                .with_child(
                    PageElement::new("button")
                        .with_attribute("aria-labelledby", "title missing")
                        .with_attribute("aria-describedby", "hint"),
                )
                .with_child(PageElement::new("span").with_attribute("aria-hidden", "true"))
                .with_child(PageElement::new("p").with_attribute("role", "note").with_attribute("aria-label", "Note"))
                .with_child(PageElement::new("em")),
        );
        page.labels.insert("title".into(), "Save".into());
        page.labels.insert("hint".into(), "Saves the draft".into());

        let doc = TreeCapturer::new(&page).capture(&page.root, 100).unwrap();
        let children = &doc.element.children;

        let button = children[0].accessibility.as_ref().unwrap();
        assert_eq!(button.label.as_deref(), Some("Save"));
        assert_eq!(button.description.as_deref(), Some("Saves the draft"));

        assert_eq!(children[1].accessibility.as_ref().unwrap().hidden, Some(true));

        let note = children[2].accessibility.as_ref().unwrap();
        assert_eq!(note.role.as_deref(), Some("note"));
        assert_eq!(note.label.as_deref(), Some("Note"));

        assert!(children[3].accessibility.is_none());
        assert!(doc.element.accessibility.is_none());
    }

    #[test]
    fn test_image_source_captured() {
        let page = snapshot(PageElement::new("img").with_attribute("src", "/logo.png"));
        let doc = TreeCapturer::new(&page).capture(&page.root, 100).unwrap();
        assert_eq!(doc.element.src.as_deref(), Some("/logo.png"));
    }

    #[test]
    fn test_element_limit() {
        let mut root = PageElement::new("ul");
        for _ in 0..100 {
            root = root.with_child(PageElement::new("li"));
        }
        let page = snapshot(root);

        let err = TreeCapturer::new(&page).capture(&page.root, 100).unwrap_err();
        assert!(matches!(err, PipelineError::ElementLimitExceeded { count: 101, limit: 100 }));
        assert!(TreeCapturer::new(&page).capture(&page.root, 101).is_ok());
    }

    #[test]
    fn test_count_live_elements_stops_at_svg() {
        let svg = PageElement::new("svg").with_child(PageElement::new("g").with_child(PageElement::new("path")));
        let root = PageElement::new("div").with_child(svg).with_child(PageElement::new("p"));
        assert_eq!(count_live_elements(&root), 3);
    }

    #[test]
    fn test_capture_id_format() {
        let id = generate_capture_id();
        let suffix = id.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 7);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}
