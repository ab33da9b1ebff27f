use thiserror::Error;

use crate::capture::document::CaptureElement;
use crate::error::PipelineError;
use crate::mapping::style::is_svg_element;
use crate::rebuild::host::DesignHost;

/// Why inline SVG markup was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SvgValidationError {
    #[error("markup is empty")]
    Empty,

    #[error("markup does not start with an <svg> tag")]
    MissingSvgRoot,

    #[error("markup contains a <script> element")]
    ScriptTag,

    #[error("markup contains the event handler attribute {0}")]
    EventHandler(String),

    #[error("markup contains a javascript: URL")]
    JavascriptUrl,
}

/// Check that `markup` is a standalone `<svg>` document with no script vectors
pub fn validate_svg_markup(markup: &str) -> Result<(), SvgValidationError> {
    let trimmed = markup.trim();
    if trimmed.is_empty() {
        return Err(SvgValidationError::Empty);
    }

    let lower = trimmed.to_ascii_lowercase();
    let opens_svg = lower
        .strip_prefix("<svg")
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/'));
    if !opens_svg {
        return Err(SvgValidationError::MissingSvgRoot);
    }

    if lower.contains("<script") {
        return Err(SvgValidationError::ScriptTag);
    }
    if let Some(handler) = find_event_handler(&lower) {
        return Err(SvgValidationError::EventHandler(handler));
    }
    if lower.contains("javascript:") {
        return Err(SvgValidationError::JavascriptUrl);
    }
    Ok(())
}

/// Find an `on<letters>` attribute name followed by `=`, ignoring matches
/// inside longer names such as `data-on` or `button`
fn find_event_handler(lower: &str) -> Option<String> {
    let bytes = lower.as_bytes();
    let mut from = 0;

    while let Some(offset) = lower[from..].find("on") {
        let start = from + offset;
        from = start + 2;

        if start > 0 && is_name_byte(bytes[start - 1]) {
            continue;
        }

        let mut end = start + 2;
        while end < bytes.len() && bytes[end].is_ascii_lowercase() {
            end += 1;
        }
        if end == start + 2 {
            continue;
        }

        let mut next = end;
        while next < bytes.len() && bytes[next].is_ascii_whitespace() {
            next += 1;
        }
        if next < bytes.len() && bytes[next] == b'=' {
            return Some(lower[start..end].to_string());
        }
    }
    None
}

/// Bytes that continue an attribute name; anything else separates attributes
fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_lowercase() || byte.is_ascii_digit() || matches!(byte, b'_' | b':' | b'.' | b'-')
}

/// Import an inline `svg` element through the host.
///
/// Returns `Ok(None)` for elements that are not inline SVG; unsafe markup
/// is refused before the host sees it.
pub async fn try_import_inline_svg<H: DesignHost>(
    element: &CaptureElement,
    host: &mut H,
) -> anyhow::Result<Option<H::Node>> {
    let Some(markup) = element.svg_content.as_deref() else {
        return Ok(None);
    };
    if !is_svg_element(&element.tag_name) {
        return Ok(None);
    }

    validate_svg_markup(markup).map_err(PipelineError::from)?;
    let node = host.import_svg(markup).await?;
    Ok(Some(node))
}
