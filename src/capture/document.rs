use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Wire format version; validation accepts this literal only
pub const CAPTURE_VERSION: &str = "1.0";

/// CSS property name to computed value, in computed-style enumeration order
pub type StyleMap = IndexMap<String, String>;

/// Bounding box of a captured element, relative to the viewport
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Accessibility metadata; only attached when at least one field is set
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct AccessibilityData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

impl AccessibilityData {
    pub fn is_empty(&self) -> bool {
        let blank = |value: &Option<String>| value.as_deref().is_none_or(str::is_empty);
        blank(&self.role) && blank(&self.label) && blank(&self.description) && self.hidden.is_none()
    }

    /// Returns `None` for metadata with no fields set
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

/// Computed styles of the `::before` and `::after` pseudo-elements
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct PseudoStyles {
    #[serde(default)]
    pub before: StyleMap,
    #[serde(default)]
    pub after: StyleMap,
}

/// Viewport dimensions at capture time
///
/// Only object-ness is validated; dimensions that are missing or not
/// numbers read as zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Viewport {
    #[serde(default, deserialize_with = "number_or_zero")]
    #[schemars(with = "f64")]
    pub width: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    #[schemars(with = "f64")]
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(0.0))
}

/// A node of the captured tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptureElement {
    /// The element's `id` attribute, empty when absent
    #[serde(default)]
    pub id: String,

    /// Lower-cased tag name
    pub tag_name: String,

    #[serde(default)]
    pub styles: StyleMap,

    #[serde(default)]
    pub pseudo: PseudoStyles,

    pub children: Vec<CaptureElement>,

    #[serde(default)]
    pub bounding_box: BoundingBox,

    /// Verbatim outer markup of an `svg` element; its children are never captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg_content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<AccessibilityData>,

    /// Trimmed text of the element's direct text children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Current source of an `img` element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

impl CaptureElement {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            tag_name: tag_name.into().to_lowercase(),
            styles: StyleMap::new(),
            pseudo: PseudoStyles::default(),
            children: Vec::new(),
            bounding_box: BoundingBox::default(),
            svg_content: None,
            accessibility: None,
            text: None,
            src: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(property.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<CaptureElement>) -> Self {
        self.children = children;
        self
    }

    pub fn with_bounding_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = BoundingBox::new(x, y, width, height);
        self
    }

    pub fn with_svg_content(mut self, markup: impl Into<String>) -> Self {
        self.svg_content = Some(markup.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    pub fn with_accessibility(mut self, accessibility: AccessibilityData) -> Self {
        self.accessibility = accessibility.non_empty();
        self
    }

    pub fn add_child(&mut self, child: CaptureElement) {
        self.children.push(child);
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles.get(property).map(String::as_str)
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Count this element and all of its descendants
    pub fn count_elements(&self) -> usize {
        1 + self.children.iter().map(CaptureElement::count_elements).sum::<usize>()
    }
}

/// The serializable intermediate representation of a captured subtree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct CaptureDocument {
    #[serde(default)]
    pub id: String,
    pub version: String,
    /// ISO-8601 capture time
    pub timestamp: String,
    pub url: String,
    pub viewport: Viewport,
    pub element: CaptureElement,
}

impl CaptureDocument {
    pub fn count_elements(&self) -> usize {
        self.element.count_elements()
    }
}

/// JSON Schema of the capture document wire format
pub fn capture_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(CaptureDocument)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_builder_lowercases_tag() {
        let element = CaptureElement::new("DIV")
            .with_id("hero")
            .with_style("display", "flex")
            .with_bounding_box(1.0, 2.0, 3.0, 4.0);

        assert_eq!(element.tag_name, "div");
        assert_eq!(element.id, "hero");
        assert_eq!(element.style("display"), Some("flex"));
        assert_eq!(element.bounding_box, BoundingBox::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn test_count_elements() {
        let mut root = CaptureElement::new("body");
        let mut section = CaptureElement::new("section");
        section.add_child(CaptureElement::new("p"));
        section.add_child(CaptureElement::new("p"));
        root.add_child(section);
        root.add_child(CaptureElement::new("footer"));

        assert_eq!(root.count_elements(), 5);
    }

    #[test]
    fn test_empty_accessibility_is_dropped() {
        let element = CaptureElement::new("div").with_accessibility(AccessibilityData {
            label: Some(String::new()),
            ..Default::default()
        });
        assert!(element.accessibility.is_none());

        let element = CaptureElement::new("div").with_accessibility(AccessibilityData {
            hidden: Some(true),
            ..Default::default()
        });
        assert_eq!(element.accessibility.unwrap().hidden, Some(true));
    }

    #[test]
    fn test_styles_keep_insertion_order() {
        let element = CaptureElement::new("div")
            .with_style("z-index", "1")
            .with_style("align-content", "normal")
            .with_style("color", "rgb(0, 0, 0)");

        let json = serde_json::to_string(&element).unwrap();
        let z = json.find("z-index").unwrap();
        let align = json.find("align-content").unwrap();
        let color = json.find("\"color\"").unwrap();
        assert!(z < align && align < color);
    }

    #[test]
    fn test_camel_case_and_optional_fields() {
        let element = CaptureElement::new("svg").with_svg_content("<svg></svg>");
        let value = serde_json::to_value(&element).unwrap();

        assert_eq!(value["tagName"], "svg");
        assert_eq!(value["svgContent"], "<svg></svg>");
        assert!(value.get("boundingBox").is_some());
        assert!(value.get("accessibility").is_none());
        assert!(value.get("text").is_none());
    }

    #[test]
    fn test_viewport_tolerates_non_numbers() {
        let viewport: Viewport = serde_json::from_str(r#"{"width": "wide"}"#).unwrap();
        assert_eq!(viewport, Viewport::new(0.0, 0.0));
    }

    #[test]
    fn test_capture_schema_describes_document() {
        let schema = capture_schema();
        let text = schema.to_string();
        assert!(text.contains("tagName"));
        assert!(text.contains("boundingBox"));
    }
}
