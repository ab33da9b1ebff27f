//! Size-capped JSON serialization of capture documents

use crate::capture::document::CaptureDocument;
use crate::config::CaptureOptions;
use crate::error::{PipelineError, Result};

/// Serialize `doc` as pretty-printed JSON within the default 2 MiB limit
pub fn to_json(doc: &CaptureDocument) -> Result<String> {
    to_json_with(doc, &CaptureOptions::default())
}

/// Serialize `doc`, failing when the UTF-8 output exceeds `options.max_json_bytes`
pub fn to_json_with(doc: &CaptureDocument, options: &CaptureOptions) -> Result<String> {
    let json = if options.pretty {
        serde_json::to_string_pretty(doc)?
    } else {
        serde_json::to_string(doc)?
    };
    check_size(json.len(), options.max_json_bytes)?;
    Ok(json)
}

/// The limit is inclusive: exactly `limit` bytes passes
pub fn check_size(size: usize, limit: usize) -> Result<()> {
    if size > limit {
        log::warn!("Serialized capture is {} bytes, limit is {}", size, limit);
        return Err(PipelineError::SizeLimitExceeded { size, limit });
    }
    Ok(())
}
