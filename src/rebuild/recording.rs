use anyhow::bail;
use async_trait::async_trait;
use serde::Serialize;

use crate::rebuild::host::DesignHost;
use crate::rebuild::node::{FrameSpec, Geometry, TextSpec};

/// What a recorded node was created from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordedKind {
    Frame(FrameSpec),
    Text(TextSpec),
    Vector { markup: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedNode {
    pub id: usize,
    #[serde(flatten)]
    pub kind: RecordedKind,
    /// Set by `position`; frames carry their geometry in their `FrameSpec`
    #[serde(rename = "position", skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(skip)]
    pub parent: Option<usize>,
    #[serde(skip)]
    pub children: Vec<usize>,
    #[serde(skip)]
    pub removed: bool,
}

impl RecordedNode {
    /// Where the node ended up: its explicit position, else its frame geometry
    pub fn geometry(&self) -> Option<Geometry> {
        match (&self.geometry, &self.kind) {
            (Some(geometry), _) => Some(*geometry),
            (None, RecordedKind::Frame(spec)) => Some(spec.geometry),
            (None, _) => None,
        }
    }
}

/// A recorded node with its attached descendants, for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedTree {
    #[serde(flatten)]
    pub node: RecordedNode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RecordedTree>,
}

/// In-memory design host that records every call.
///
/// Used for dry runs and tests; failures can be injected per frame name
/// or for every SVG import.
#[derive(Debug, Default)]
pub struct RecordingHost {
    nodes: Vec<RecordedNode>,
    page: Vec<usize>,
    failing_frames: Vec<String>,
    fail_svg_imports: bool,
    fail_text_appends: bool,
    creation_calls: usize,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create_frame` fail for frames named `name`
    pub fn fail_frames_named(mut self, name: impl Into<String>) -> Self {
        self.failing_frames.push(name.into());
        self
    }

    pub fn fail_svg_imports(mut self, fail: bool) -> Self {
        self.fail_svg_imports = fail;
        self
    }

    /// Make `append_child` fail whenever the child is a text node
    pub fn fail_text_appends(mut self, fail: bool) -> Self {
        self.fail_text_appends = fail;
        self
    }

    /// Number of create/import calls, including failed ones
    pub fn creation_calls(&self) -> usize {
        self.creation_calls
    }

    pub fn nodes(&self) -> &[RecordedNode] {
        &self.nodes
    }

    pub fn node(&self, id: usize) -> Option<&RecordedNode> {
        self.nodes.get(id)
    }

    /// Ids attached at page level, in attachment order
    pub fn page_nodes(&self) -> &[usize] {
        &self.page
    }

    /// Nodes that are neither removed nor beneath a removed node
    pub fn live_nodes(&self) -> impl Iterator<Item = &RecordedNode> {
        self.nodes.iter().filter(|node| !node.removed)
    }

    pub fn removed_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.removed).count()
    }

    /// Page-level nodes with their attached descendants
    pub fn tree(&self) -> Vec<RecordedTree> {
        self.page.iter().filter_map(|id| self.subtree(*id)).collect()
    }

    fn subtree(&self, id: usize) -> Option<RecordedTree> {
        let node = self.nodes.get(id).filter(|node| !node.removed)?;
        Some(RecordedTree {
            node: node.clone(),
            children: node.children.iter().filter_map(|child| self.subtree(*child)).collect(),
        })
    }

    fn push(&mut self, kind: RecordedKind) -> usize {
        let id = self.nodes.len();
        self.nodes.push(RecordedNode {
            id,
            kind,
            geometry: None,
            parent: None,
            children: Vec::new(),
            removed: false,
        });
        id
    }

    fn detach(&mut self, id: usize) {
        match self.nodes[id].parent.take() {
            Some(parent) => self.nodes[parent].children.retain(|child| *child != id),
            None => self.page.retain(|page| *page != id),
        }
    }
}

#[async_trait]
impl DesignHost for RecordingHost {
    type Node = usize;

    fn create_frame(&mut self, spec: &FrameSpec) -> anyhow::Result<usize> {
        self.creation_calls += 1;
        if self.failing_frames.contains(&spec.name) {
            bail!("frame creation rejected for {}", spec.name);
        }
        Ok(self.push(RecordedKind::Frame(spec.clone())))
    }

    fn create_text(&mut self, spec: &TextSpec) -> anyhow::Result<usize> {
        self.creation_calls += 1;
        Ok(self.push(RecordedKind::Text(spec.clone())))
    }

    async fn import_svg(&mut self, markup: &str) -> anyhow::Result<usize> {
        self.creation_calls += 1;
        if self.fail_svg_imports {
            bail!("vector import failed");
        }
        Ok(self.push(RecordedKind::Vector { markup: markup.to_string() }))
    }

    fn append_child(&mut self, parent: Option<&usize>, child: &usize) -> anyhow::Result<()> {
        let child = *child;
        if child >= self.nodes.len() {
            bail!("unknown node {child}");
        }
        if self.fail_text_appends && matches!(self.nodes[child].kind, RecordedKind::Text(_)) {
            bail!("text attachment rejected");
        }
        if let Some(parent) = parent {
            if *parent >= self.nodes.len() || self.nodes[*parent].removed {
                bail!("unknown parent node {parent}");
            }
        }

        self.detach(child);
        match parent {
            Some(parent) => {
                self.nodes[*parent].children.push(child);
                self.nodes[child].parent = Some(*parent);
            }
            None => self.page.push(child),
        }
        Ok(())
    }

    fn position(&mut self, node: &usize, geometry: Geometry) -> anyhow::Result<()> {
        match self.nodes.get_mut(*node) {
            Some(recorded) => {
                recorded.geometry = Some(geometry);
                Ok(())
            }
            None => bail!("unknown node {node}"),
        }
    }

    fn remove(&mut self, node: &usize) {
        if *node >= self.nodes.len() {
            return;
        }
        self.detach(*node);

        let mut stack = vec![*node];
        while let Some(id) = stack.pop() {
            self.nodes[id].removed = true;
            stack.extend(self.nodes[id].children.iter().copied());
        }
    }
}
