//! Capture of a live DOM subtree
//!
//! This module turns an element of a live page into a [`CaptureDocument`].
//! It includes:
//! - LiveElement / CaptureHost: the read-only view of the page the capture needs
//! - TreeCapturer: the recursive walk producing the document tree
//! - Sanitizer: the audit copy of the subtree with secrets and scripts removed
//! - PageSnapshot: an owned snapshot of a page that implements both seams

pub mod document;
pub mod purify;
pub mod sanitize;
pub mod snapshot;
pub mod tree;

pub use document::{
    AccessibilityData, BoundingBox, CAPTURE_VERSION, CaptureDocument, CaptureElement, PseudoStyles, StyleMap,
    Viewport, capture_schema,
};
pub use purify::PolicySanitizer;
pub use sanitize::{HtmlSanitizer, MarkupNode, SanitizePolicy, Sanitizer};
pub use snapshot::{PageElement, PageNode, PageSnapshot};
pub use tree::TreeCapturer;

use crate::config::CaptureOptions;
use crate::error::Result;
use crate::mapping::image::{ImageInfo, ImageStatus};
use crate::serialize;

/// Pseudo-elements whose computed style is captured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoElement {
    Before,
    After,
}

impl PseudoElement {
    pub fn selector(self) -> &'static str {
        match self {
            Self::Before => "::before",
            Self::After => "::after",
        }
    }
}

/// A child node of a live element
#[derive(Debug)]
pub enum LiveNode<'a, E> {
    Element(&'a E),
    Text(&'a str),
}

/// Read-only view of an element in the host page
pub trait LiveElement: Sized {
    /// Tag name as the host reports it (any case)
    fn tag_name(&self) -> &str;

    /// Attributes in document order
    fn attributes(&self) -> Vec<(&str, &str)>;

    /// Element and text children in document order
    fn child_nodes(&self) -> Vec<LiveNode<'_, Self>>;

    /// Serialized markup of the element and its descendants
    fn outer_html(&self) -> String;

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes()
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    fn children(&self) -> Vec<&Self> {
        self.child_nodes()
            .into_iter()
            .filter_map(|node| match node {
                LiveNode::Element(element) => Some(element),
                LiveNode::Text(_) => None,
            })
            .collect()
    }

    /// Whether the element hosts a shadow root (its content is not captured)
    fn has_shadow_root(&self) -> bool {
        false
    }

    /// Source the browser actually loaded for an image element
    fn current_src(&self) -> Option<&str> {
        self.attribute("src")
    }

    /// Intrinsic size of an image element
    fn natural_size(&self) -> (f64, f64) {
        (0.0, 0.0)
    }
}

/// Page-level lookups supplied by the capture host
pub trait CaptureHost {
    type Element: LiveElement;

    /// Computed style of an element or one of its pseudo-elements, in enumeration order
    fn computed_style(&self, element: &Self::Element, pseudo: Option<PseudoElement>) -> StyleMap;

    fn bounding_rect(&self, element: &Self::Element) -> BoundingBox;

    fn viewport(&self) -> Viewport;

    fn current_url(&self) -> String;

    /// Text content of the element with the given id, used to resolve
    /// `aria-labelledby` and `aria-describedby`
    fn text_by_id(&self, _id: &str) -> Option<String> {
        None
    }
}

/// Everything produced by one capture action
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub document: CaptureDocument,

    /// The serialized document, within the size limit
    pub json: String,

    /// Sanitized markup kept as an audit artifact; never used for rebuild
    pub sanitized_html: String,

    pub images: Vec<ImageInfo>,

    pub warnings: Vec<String>,
}

/// Capture `root`: sanitize, build the document, scan images and serialize
pub fn capture_element<H, S>(
    host: &H,
    root: &H::Element,
    sanitizer: &Sanitizer<S>,
    options: &CaptureOptions,
) -> Result<CaptureOutcome>
where
    H: CaptureHost,
    S: HtmlSanitizer,
{
    let mut warnings = Vec::new();

    if root.has_shadow_root() {
        warnings.push(
            "This element uses Shadow DOM (Web Component). Its internal content is not \
             captured; only the host element is included."
                .to_string(),
        );
    }

    let sanitized_html = sanitizer.sanitize_element(root);
    let document = TreeCapturer::new(host).capture(root, options.max_elements)?;

    let images = scan_images(root, &document.url);
    let cors_sources: Vec<&str> = images
        .iter()
        .filter(|image| image.status == ImageStatus::CorsIssue)
        .map(|image| image.src.as_str())
        .collect();
    if !cors_sources.is_empty() {
        warnings.push(format!(
            "{} image(s) with a possible CORS issue: {}",
            cors_sources.len(),
            cors_sources.join(", ")
        ));
    }

    let json = serialize::to_json_with(&document, options)?;
    log::info!(
        "Captured {} elements from {} ({} bytes)",
        document.count_elements(),
        document.url,
        json.len()
    );

    Ok(CaptureOutcome { document, json, sanitized_html, images, warnings })
}

/// Inspect every `img` element of the subtree, the root included
pub fn scan_images<E: LiveElement>(root: &E, page_url: &str) -> Vec<ImageInfo> {
    let mut images = Vec::new();
    let mut stack = vec![root];
    while let Some(element) = stack.pop() {
        if element.tag_name().eq_ignore_ascii_case("img") {
            let (width, height) = element.natural_size();
            images.push(ImageInfo::inspect(element.current_src().unwrap_or(""), width, height, page_url));
        }
        stack.extend(element.children().into_iter().rev());
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn page(root: PageElement) -> PageSnapshot {
        PageSnapshot::new("https://example.com/page", Viewport::new(1280.0, 720.0), root)
    }

    fn pass_through() -> Sanitizer<impl HtmlSanitizer> {
        Sanitizer::new(|html: &str, _: &SanitizePolicy| html.to_string())
    }

    #[test]
    fn test_pseudo_selectors() {
        assert_eq!(PseudoElement::Before.selector(), "::before");
        assert_eq!(PseudoElement::After.selector(), "::after");
    }

    #[test]
    fn test_capture_element_outcome() {
        let root = PageElement::new("section")
            .with_attribute("data-token", "s3cr3t")
            .with_child(PageElement::new("img").with_attribute("src", "https://cdn.other.net/a.png"))
            .with_child(PageElement::new("img").with_attribute("src", "/local.png"));
        let snapshot = page(root);

        let outcome =
            capture_element(&snapshot, &snapshot.root, &pass_through(), &CaptureOptions::default()).unwrap();

        assert_eq!(outcome.document.count_elements(), 3);
        assert!(!outcome.sanitized_html.contains("s3cr3t"));
        assert_eq!(outcome.images.len(), 2);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].starts_with("1 image(s)"));
        assert!(outcome.json.contains("\"version\": \"1.0\""));
    }

    #[test]
    fn test_capture_element_warns_on_shadow_root() {
        let snapshot = page(PageElement::new("my-widget").with_shadow_root(true));
        let outcome =
            capture_element(&snapshot, &snapshot.root, &pass_through(), &CaptureOptions::default()).unwrap();
        assert!(outcome.warnings[0].contains("Shadow DOM"));
    }

    #[test]
    fn test_capture_element_enforces_size_limit() {
        let snapshot = page(PageElement::new("div").with_style("content", "x".repeat(4096)));
        let options = CaptureOptions::new().max_json_bytes(1024);
        let err = capture_element(&snapshot, &snapshot.root, &pass_through(), &options).unwrap_err();
        assert!(matches!(err, PipelineError::SizeLimitExceeded { limit: 1024, .. }));
    }

    #[test]
    fn test_scan_images_in_document_order() {
        let root = PageElement::new("div")
            .with_child(PageElement::new("p").with_child(PageElement::new("img").with_attribute("src", "a.png")))
            .with_child(PageElement::new("img"));
        let images = scan_images(&root, "https://example.com/");

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].src, "a.png");
        assert_eq!(images[0].status, ImageStatus::Ok);
        assert_eq!(images[1].status, ImageStatus::Missing);
    }
}
