use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

/// Heuristic loadability of an image reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageStatus {
    Ok,
    CorsIssue,
    Missing,
}

/// An image found in a captured subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub src: String,
    pub status: ImageStatus,
    pub width: f64,
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ImageInfo {
    /// Classify `src` and attach the warning shown for its status
    pub fn inspect(src: &str, width: f64, height: f64, page_url: &str) -> Self {
        let status = classify_image(src, page_url);
        let warning = match status {
            ImageStatus::Ok => None,
            ImageStatus::Missing => Some("Image has no src attribute.".to_string()),
            ImageStatus::CorsIssue => Some(
                "Image may not load in the design tool due to CORS restrictions. \
                 A placeholder will be used if the URL is inaccessible."
                    .to_string(),
            ),
        };
        let (width, height) = if status == ImageStatus::Missing { (0.0, 0.0) } else { (width, height) };

        Self { src: src.to_string(), status, width, height, warning }
    }
}

/// Classify an image source against the page it was captured from.
///
/// No request is made: `data:` URIs are embedded, same-origin sources are
/// assumed loadable, anything else (including unparseable URLs) is flagged.
pub fn classify_image(src: &str, page_url: &str) -> ImageStatus {
    let src = src.trim();
    if src.is_empty() {
        return ImageStatus::Missing;
    }
    if src.starts_with("data:") {
        return ImageStatus::Ok;
    }
    if is_same_origin(src, page_url) {
        ImageStatus::Ok
    } else {
        ImageStatus::CorsIssue
    }
}

fn is_same_origin(src: &str, page_url: &str) -> bool {
    let Ok(base) = Url::parse(page_url) else {
        return false;
    };
    match base.join(src) {
        Ok(resolved) => {
            let origin = base.origin();
            origin.is_tuple() && resolved.origin() == origin
        }
        Err(_) => false,
    }
}
