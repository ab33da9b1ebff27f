//! Limits and tunables for the capture and rebuild stages

/// Maximum number of elements a capture or rebuild may contain
pub const MAX_ELEMENTS: usize = 100;

/// Maximum size of a serialized capture document, in UTF-8 bytes (2 MiB)
pub const MAX_JSON_BYTES: usize = 2 * 1024 * 1024;

/// Number of nodes materialized between two yield points
pub const BATCH_SIZE: usize = 50;

/// Options for capturing a live subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Maximum element count of the captured subtree
    pub max_elements: usize,

    /// Maximum serialized size in bytes
    pub max_json_bytes: usize,

    /// Pretty-print the serialized document
    pub pretty: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            max_elements: MAX_ELEMENTS,
            max_json_bytes: MAX_JSON_BYTES,
            pretty: true,
        }
    }
}

impl CaptureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }

    pub fn max_json_bytes(mut self, max_json_bytes: usize) -> Self {
        self.max_json_bytes = max_json_bytes;
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Options for rebuilding a capture document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildOptions {
    /// Apply structure and geometry only, skipping style and font resolution
    pub lightweight: bool,

    /// Maximum element count accepted for rebuild
    pub max_nodes: usize,

    /// Nodes processed per batch
    pub batch_size: usize,
}

impl Default for RebuildOptions {
    fn default() -> Self {
        Self {
            lightweight: false,
            max_nodes: MAX_ELEMENTS,
            batch_size: BATCH_SIZE,
        }
    }
}

impl RebuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lightweight(mut self, lightweight: bool) -> Self {
        self.lightweight = lightweight;
        self
    }

    pub fn max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Set the batch size; zero is treated as one
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}
