use thiserror::Error;

use crate::rebuild::svg::SvgValidationError;
use crate::validate::SchemaViolation;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn megabytes(bytes: &usize) -> f64 {
    *bytes as f64 / BYTES_PER_MB
}

/// Errors raised anywhere between the live page and the rebuilt node tree
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The JSON text is not syntactically valid
    #[error("Invalid JSON: {0}")]
    Parse(String),

    /// Well-formed JSON that does not match the capture document schema
    #[error("Invalid capture document: {0}")]
    Schema(#[from] SchemaViolation),

    /// The live subtree holds more elements than a capture may contain
    #[error("Element limit exceeded: subtree has {count} elements, the limit is {limit}")]
    ElementLimitExceeded { count: usize, limit: usize },

    /// The serialized document is larger than the transport ceiling
    #[error(
        "Capture too large: {:.2} MB exceeds the {:.2} MB limit",
        megabytes(.size),
        megabytes(.limit)
    )]
    SizeLimitExceeded { size: usize, limit: usize },

    /// The document holds more elements than a rebuild may create
    #[error("Node limit exceeded: document has {count} elements, the limit is {limit}")]
    NodeLimitExceeded { count: usize, limit: usize },

    #[error("Unsafe inline SVG: {0}")]
    SvgValidation(#[from] SvgValidationError),

    /// A single node failed to materialize
    #[error("{tag}#{index}: {reason}")]
    Node {
        index: usize,
        tag: String,
        reason: String,
    },

    #[error("Rebuild cancelled")]
    Cancelled,

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Script evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),
}

impl PipelineError {
    /// Whether the error aborts the whole operation rather than a single node
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::SvgValidation(_) | Self::Node { .. })
    }
}

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, PipelineError>;
