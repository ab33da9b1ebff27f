//! Per-node decisions: what frame or text node a captured element becomes

use serde::Serialize;

use crate::capture::document::{BoundingBox, CaptureElement};
use crate::mapping::font::{DEFAULT_FONT, ResolvedFont};
use crate::mapping::style::{
    LayoutMode, Rgba, accessible_name, map_layout_mode, parse_border_radius, parse_color, parse_opacity,
    parse_spacing,
};

const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Position and size of a created node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Geometry of `bounds` relative to `parent`; absolute when there is no parent
    pub fn relative_to(bounds: &BoundingBox, parent: Option<&BoundingBox>) -> Self {
        let (origin_x, origin_y) = parent.map_or((0.0, 0.0), |p| (p.x, p.y));
        Self {
            x: bounds.x - origin_x,
            y: bounds.y - origin_y,
            width: bounds.width,
            height: bounds.height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// A frame to create for one captured element
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSpec {
    pub name: String,
    pub geometry: Geometry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Rgba>,
    pub corner_radius: f64,
    pub opacity: f64,
    pub layout_mode: LayoutMode,
    pub item_spacing: f64,
    pub padding: Padding,
}

impl FrameSpec {
    /// Name and geometry only
    pub fn lightweight(element: &CaptureElement, geometry: Geometry) -> Self {
        Self {
            name: frame_name(element),
            geometry,
            fill: None,
            corner_radius: 0.0,
            opacity: 1.0,
            layout_mode: LayoutMode::None,
            item_spacing: 0.0,
            padding: Padding::default(),
        }
    }

    /// Frame with fill, radius, opacity, auto-layout and padding mapped from computed styles
    pub fn from_element(element: &CaptureElement, geometry: Geometry) -> Self {
        let style = |property: &str| element.style(property).unwrap_or_default();

        let fill = parse_color(style("background-color")).filter(|color| !color.is_transparent());

        let mut corner_radius = parse_border_radius(style("border-radius"));
        if corner_radius == 0.0 {
            corner_radius = parse_border_radius(style("border-top-left-radius"));
        }

        let opacity = element.style("opacity").map_or(1.0, parse_opacity);
        let layout_mode = map_layout_mode(style("display"), style("flex-direction"));

        let mut item_spacing = parse_spacing(style("gap"));
        if item_spacing == 0.0 {
            item_spacing = match layout_mode {
                LayoutMode::Horizontal => parse_spacing(style("column-gap")),
                LayoutMode::Vertical => parse_spacing(style("row-gap")),
                LayoutMode::None => 0.0,
            };
        }

        let padding = Padding {
            top: parse_spacing(style("padding-top")),
            right: parse_spacing(style("padding-right")),
            bottom: parse_spacing(style("padding-bottom")),
            left: parse_spacing(style("padding-left")),
        };

        Self {
            name: frame_name(element),
            geometry,
            fill,
            corner_radius,
            opacity,
            layout_mode,
            item_spacing,
            padding,
        }
    }
}

fn frame_name(element: &CaptureElement) -> String {
    let label = element.accessibility.as_ref().and_then(|a| a.label.as_deref());
    accessible_name(&element.tag_name, label)
}

/// A text node holding an element's own text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSpec {
    pub characters: String,
    pub font_family: String,
    pub font_size: f64,
    pub color: Rgba,
}

impl TextSpec {
    /// Default font, size and color
    pub fn lightweight(characters: impl Into<String>) -> Self {
        Self {
            characters: characters.into(),
            font_family: DEFAULT_FONT.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            color: Rgba::BLACK,
        }
    }

    pub fn from_element(element: &CaptureElement, characters: impl Into<String>, font: &ResolvedFont) -> Self {
        let color = element.style("color").and_then(parse_color).unwrap_or(Rgba::BLACK);
        let font_size = element
            .style("font-size")
            .map(parse_spacing)
            .filter(|size| *size > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZE);

        Self {
            characters: characters.into(),
            font_family: font.name.clone(),
            font_size,
            color,
        }
    }
}
