//! Conversions from computed CSS values to design-tool primitives.
//!
//! Every function here is total: unparseable input yields a sentinel
//! (`None`, `0.0`, `1.0` or [`LayoutMode::None`]) and never an error.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An RGBA color with every channel in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };

    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }
}

/// Auto-layout direction of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutMode {
    Horizontal,
    Vertical,
    #[default]
    None,
}

/// Parse a hex (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`) or `rgb()`/`rgba()` color.
///
/// Named colors, `hsl()`, `currentColor` and gradients return `None`.
pub fn parse_color(css: &str) -> Option<Rgba> {
    let css = css.trim();
    if let Some(hex) = css.strip_prefix('#') {
        return parse_hex(hex);
    }
    parse_rgb_function(css)
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match hex.len() {
        3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => hex.to_string(),
        _ => return None,
    };

    let channel = |start: usize| -> Option<f64> {
        let byte = u8::from_str_radix(expanded.get(start..start + 2)?, 16).ok()?;
        Some(f64::from(byte) / 255.0)
    };

    Some(Rgba {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
        a: if expanded.len() == 8 { channel(6)? } else { 1.0 },
    })
}

fn parse_rgb_function(css: &str) -> Option<Rgba> {
    let lower = css.to_ascii_lowercase();
    let inner = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;

    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let channel = |part: &str| -> Option<f64> {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value: u16 = part.parse().ok()?;
        (value <= 255).then(|| f64::from(value) / 255.0)
    };

    let alpha = match parts.get(3) {
        Some(part) => {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
                return None;
            }
            part.parse::<f64>().ok()?.clamp(0.0, 1.0)
        }
        None => 1.0,
    };

    Some(Rgba {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a: alpha,
    })
}

/// Parse a literal `<number>px` value
fn parse_pixels(value: &str) -> Option<f64> {
    let number = value.strip_suffix("px")?;
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    number.parse().ok()
}

/// Map a `border-radius` value to a radius; only `<number>px` is understood
pub fn parse_border_radius(css: &str) -> f64 {
    parse_pixels(css).unwrap_or(0.0)
}

/// Map a gap or padding value to a spacing; only `<number>px` is understood
pub fn parse_spacing(css: &str) -> f64 {
    parse_pixels(css).unwrap_or(0.0)
}

/// Parse an opacity, clamped to `[0, 1]`.
///
/// Input without a leading number maps to `1.0` so a malformed value never
/// hides content.
pub fn parse_opacity(css: &str) -> f64 {
    leading_float(css).map_or(1.0, |n| n.clamp(0.0, 1.0))
}

/// Parse the longest numeric prefix of `value`, the way `parseFloat` does
fn leading_float(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    let candidate_len = trimmed
        .bytes()
        .take_while(|b| b.is_ascii_digit() || matches!(b, b'.' | b'+' | b'-' | b'e' | b'E'))
        .count();

    (1..=candidate_len)
        .rev()
        .find_map(|len| trimmed[..len].parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// Derive the auto-layout direction from `display` and `flex-direction`
pub fn map_layout_mode(display: &str, flex_direction: &str) -> LayoutMode {
    if display != "flex" && display != "inline-flex" {
        return LayoutMode::None;
    }
    if flex_direction == "column" {
        LayoutMode::Vertical
    } else {
        LayoutMode::Horizontal
    }
}

pub fn is_svg_element(tag_name: &str) -> bool {
    tag_name.eq_ignore_ascii_case("svg")
}

/// Name for a rebuilt node: the accessible label when present, else the tag
pub fn accessible_name(tag_name: &str, label: Option<&str>) -> String {
    match label.map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => tag_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(left: Rgba, right: Rgba) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        close(left.r, right.r) && close(left.g, right.g) && close(left.b, right.b) && close(left.a, right.a)
    }

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(parse_color("#ff0000"), Some(Rgba::new(1.0, 0.0, 0.0, 1.0)));
        assert!(approx(parse_color("#f00").unwrap(), Rgba::new(1.0, 0.0, 0.0, 1.0)));
        assert!(approx(parse_color("#FFF").unwrap(), Rgba::new(1.0, 1.0, 1.0, 1.0)));

        let with_alpha = parse_color("#00ff0080").unwrap();
        assert!((with_alpha.a - 128.0 / 255.0).abs() < 1e-9);

        let short_alpha = parse_color("#0f08").unwrap();
        assert!(approx(short_alpha, Rgba::new(0.0, 1.0, 0.0, 136.0 / 255.0)));
    }

    #[test]
    fn test_parse_hex_rejects_odd_lengths() {
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#1234567"), None);
        assert_eq!(parse_color("#ggg"), None);
        assert_eq!(parse_color("#"), None);
    }

    #[test]
    fn test_parse_rgb_functions() {
        assert_eq!(parse_color("rgb(255, 0, 0)"), Some(Rgba::new(1.0, 0.0, 0.0, 1.0)));
        let translucent = parse_color("rgba(0, 0, 255, 0.5)").unwrap();
        assert!(approx(translucent, Rgba::new(0.0, 0.0, 1.0, 0.5)));
        assert_eq!(parse_color("rgba(0, 0, 0, 0)").map(|c| c.is_transparent()), Some(true));
    }

    #[test]
    fn test_parse_color_unsupported_syntax() {
        assert_eq!(parse_color("hsl(0,100%,50%)"), None);
        assert_eq!(parse_color("red"), None);
        assert_eq!(parse_color("currentColor"), None);
        assert_eq!(parse_color("linear-gradient(rgb(1, 2, 3), rgb(4, 5, 6))"), None);
        assert_eq!(parse_color("rgb(300, 0, 0)"), None);
        assert_eq!(parse_color("rgb(255 0 0)"), None);
    }

    #[test]
    fn test_pixel_values() {
        assert_eq!(parse_border_radius("8px"), 8.0);
        assert_eq!(parse_border_radius("4.5px"), 4.5);
        assert_eq!(parse_border_radius("50%"), 0.0);
        assert_eq!(parse_border_radius("auto"), 0.0);
        assert_eq!(parse_border_radius("4px 8px"), 0.0);
        assert_eq!(parse_spacing("16px"), 16.0);
        assert_eq!(parse_spacing("-4px"), 0.0);
        assert_eq!(parse_spacing("normal"), 0.0);
    }

    #[test]
    fn test_parse_opacity() {
        assert_eq!(parse_opacity("0.5"), 0.5);
        assert_eq!(parse_opacity("1"), 1.0);
        assert_eq!(parse_opacity("2"), 1.0);
        assert_eq!(parse_opacity("-1"), 0.0);
        assert_eq!(parse_opacity("0.25abc"), 0.25);
        assert_eq!(parse_opacity("abc"), 1.0);
        assert_eq!(parse_opacity(""), 1.0);
    }

    #[test]
    fn test_map_layout_mode() {
        assert_eq!(map_layout_mode("flex", "row"), LayoutMode::Horizontal);
        assert_eq!(map_layout_mode("inline-flex", "column"), LayoutMode::Vertical);
        assert_eq!(map_layout_mode("flex", "row-reverse"), LayoutMode::Horizontal);
        assert_eq!(map_layout_mode("block", "column"), LayoutMode::None);
        assert_eq!(map_layout_mode("grid", "row"), LayoutMode::None);
    }

    #[test]
    fn test_svg_and_names() {
        assert!(is_svg_element("SVG"));
        assert!(!is_svg_element("svgx"));
        assert_eq!(accessible_name("button", Some("  Submit ")), "Submit");
        assert_eq!(accessible_name("button", Some("   ")), "button");
        assert_eq!(accessible_name("div", None), "div");
    }

    #[test]
    fn test_layout_mode_wire_names() {
        assert_eq!(serde_json::to_string(&LayoutMode::Vertical).unwrap(), "\"VERTICAL\"");
        assert_eq!(serde_json::to_string(&LayoutMode::None).unwrap(), "\"NONE\"");
    }
}
