use async_trait::async_trait;

use crate::rebuild::node::{FrameSpec, Geometry, TextSpec};

/// Node-creation primitives of the design tool a document is rebuilt into
#[async_trait]
pub trait DesignHost: Send {
    /// Handle to a node created by this host
    type Node: Clone + Send + Sync;

    fn create_frame(&mut self, spec: &FrameSpec) -> anyhow::Result<Self::Node>;

    fn create_text(&mut self, spec: &TextSpec) -> anyhow::Result<Self::Node>;

    /// Import inline SVG markup as a vector node
    async fn import_svg(&mut self, markup: &str) -> anyhow::Result<Self::Node>;

    /// Attach `child` under `parent`, or at page level when `parent` is `None`
    fn append_child(&mut self, parent: Option<&Self::Node>, child: &Self::Node) -> anyhow::Result<()>;

    /// Move and resize a node created without geometry (imported vectors)
    fn position(&mut self, _node: &Self::Node, _geometry: Geometry) -> anyhow::Result<()> {
        Ok(())
    }

    /// Remove a node and its descendants
    fn remove(&mut self, _node: &Self::Node) {}
}

/// The host's "yield and resume" primitive, awaited between batches
#[async_trait]
pub trait Scheduler: Send {
    async fn yield_now(&mut self);
}

/// Resumes immediately; counts how often it was asked to yield
#[derive(Debug, Default)]
pub struct ImmediateScheduler {
    pub yields: usize,
}

impl ImmediateScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Scheduler for ImmediateScheduler {
    async fn yield_now(&mut self) {
        self.yields += 1;
    }
}

/// Yields to the tokio runtime so other tasks run between batches
#[cfg(feature = "tokio")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[cfg(feature = "tokio")]
#[async_trait]
impl Scheduler for TokioScheduler {
    async fn yield_now(&mut self) {
        tokio::task::yield_now().await;
    }
}
