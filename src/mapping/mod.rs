//! Per-node decisions used while rebuilding: CSS value mapping, font
//! fallback and image loadability.

pub mod font;
pub mod image;
pub mod style;

pub use font::{DEFAULT_FONT, ResolvedFont, resolve_font_name};
pub use image::{ImageInfo, ImageStatus, classify_image};
pub use style::{
    LayoutMode, Rgba, accessible_name, is_svg_element, map_layout_mode, parse_border_radius, parse_color,
    parse_opacity, parse_spacing,
};
