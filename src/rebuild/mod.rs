//! Chunked reconstruction of a capture document in a design tool
//!
//! This module drives node creation for a validated [`CaptureDocument`].
//! It includes:
//! - DesignHost / Scheduler: the node-creation and yield primitives of the host
//! - ChunkedRebuilder: the batched, yielding traversal producing an ImportReport
//! - FrameSpec / TextSpec: per-node style, layout and font decisions
//! - RecordingHost: an in-memory host for dry runs

pub mod host;
pub mod node;
pub mod recording;
pub mod report;
pub mod svg;

pub use host::{DesignHost, ImmediateScheduler, Scheduler};
#[cfg(feature = "tokio")]
pub use host::TokioScheduler;
pub use node::{FrameSpec, Geometry, Padding, TextSpec};
pub use recording::{RecordedKind, RecordedNode, RecordedTree, RecordingHost};
pub use report::{FontSubstitution, ImportReport};
pub use svg::{SvgValidationError, try_import_inline_svg, validate_svg_markup};

use tokio_util::sync::CancellationToken;

use crate::capture::document::{CaptureDocument, CaptureElement};
use crate::config::RebuildOptions;
use crate::error::{PipelineError, Result};
use crate::mapping::font::{DEFAULT_FONT, ResolvedFont, resolve_font_name};
use crate::mapping::image::{ImageStatus, classify_image};

/// Fail when `doc` holds more than `limit` elements; returns the count otherwise
pub fn assert_node_limit(doc: &CaptureDocument, limit: usize) -> Result<usize> {
    let count = doc.count_elements();
    if count > limit {
        log::warn!("Refusing rebuild of {} elements, limit is {}", count, limit);
        return Err(PipelineError::NodeLimitExceeded { count, limit });
    }
    Ok(count)
}

/// One element of the flattened tree
struct Item<'d> {
    element: &'d CaptureElement,
    parent: Option<usize>,
}

/// Pre-order flattening, so items are processed in captured document order
fn flatten(root: &CaptureElement) -> Vec<Item<'_>> {
    let mut items = Vec::new();
    let mut stack = vec![(root, None)];

    while let Some((element, parent)) = stack.pop() {
        let index = items.len();
        items.push(Item { element, parent });
        for child in element.children.iter().rev() {
            stack.push((child, Some(index)));
        }
    }
    items
}

fn node_error(index: usize, element: &CaptureElement, reason: impl ToString) -> PipelineError {
    PipelineError::Node {
        index,
        tag: element.tag_name.clone(),
        reason: reason.to_string(),
    }
}

/// Rebuilds capture documents in fixed-size batches, yielding between them
#[derive(Debug, Clone, Default)]
pub struct ChunkedRebuilder {
    options: RebuildOptions,
    cancel: Option<CancellationToken>,
}

impl ChunkedRebuilder {
    pub fn new(options: RebuildOptions) -> Self {
        Self { options, cancel: None }
    }

    /// Stop at the next yield boundary once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Rebuild `doc` through `host`.
    ///
    /// The node limit is checked before anything is created. Nodes are then
    /// created in document order, `batch_size` at a time; after each batch
    /// `on_progress` receives `round(processed / total * 100)` and, if work
    /// remains, `scheduler` is awaited. Per-node failures end up in the
    /// report. On cancellation every node created so far is removed.
    pub async fn rebuild<H, S, P>(
        &self,
        doc: &CaptureDocument,
        host: &mut H,
        scheduler: &mut S,
        mut on_progress: P,
    ) -> Result<ImportReport>
    where
        H: DesignHost,
        S: Scheduler,
        P: FnMut(u8) + Send,
    {
        let total = assert_node_limit(doc, self.options.max_nodes)?;
        let items = flatten(&doc.element);
        let mut created: Vec<Option<H::Node>> = vec![None; items.len()];
        let mut page_level: Vec<H::Node> = Vec::new();
        let mut report = ImportReport::new(total);
        let batch_size = self.options.batch_size.max(1);

        log::info!(
            "Rebuilding {} elements from {} ({} mode)",
            total,
            doc.url,
            if self.options.lightweight { "lightweight" } else { "full" }
        );

        let mut processed = 0;
        while processed < items.len() {
            if self.is_cancelled() {
                log::info!("Rebuild cancelled after {} of {} elements", processed, total);
                for node in page_level.iter().rev() {
                    host.remove(node);
                }
                return Err(PipelineError::Cancelled);
            }

            let end = (processed + batch_size).min(items.len());
            log::debug!("Processing batch {}..{}", processed, end);

            for index in processed..end {
                let item = &items[index];
                let anchor = nearest_created(&items, &created, index);
                let parent = anchor.and_then(|a| created[a].clone());
                let parent_box = anchor.map(|a| &items[a].element.bounding_box);
                let geometry = Geometry::relative_to(&item.element.bounding_box, parent_box);

                let node = match self
                    .materialize(doc, index, item.element, geometry, host, &mut report)
                    .await
                {
                    Ok(node) => node,
                    Err(e) => {
                        let error = node_error(index, item.element, e);
                        log::warn!("Skipping node: {}", error);
                        report.add_error(&error);
                        continue;
                    }
                };

                match host.append_child(parent.as_ref(), &node) {
                    Ok(()) => {
                        if parent.is_none() {
                            page_level.push(node.clone());
                        }
                        created[index] = Some(node);
                    }
                    Err(e) => {
                        host.remove(&node);
                        let error = node_error(index, item.element, e);
                        log::warn!("Skipping node: {}", error);
                        report.add_error(&error);
                    }
                }
            }

            processed = end;
            on_progress(progress_percent(processed, items.len()));

            if processed < items.len() {
                scheduler.yield_now().await;
            }
        }

        log::info!(
            "Rebuild finished: {} elements, {} errors, {} CORS warnings",
            report.total_elements,
            report.errors.len(),
            report.cors_warnings.len()
        );
        Ok(report)
    }

    /// Create the node for one element; text failures are reported without
    /// failing the element itself
    async fn materialize<H: DesignHost>(
        &self,
        doc: &CaptureDocument,
        index: usize,
        element: &CaptureElement,
        geometry: Geometry,
        host: &mut H,
        report: &mut ImportReport,
    ) -> anyhow::Result<H::Node> {
        if let Some(node) = try_import_inline_svg(element, host).await? {
            if let Err(e) = host.position(&node, geometry) {
                host.remove(&node);
                return Err(e);
            }
            return Ok(node);
        }

        let lightweight = self.options.lightweight;
        if !lightweight && element.is_tag("img") {
            check_image(doc, index, element, report);
        }

        let frame = if lightweight {
            FrameSpec::lightweight(element, geometry)
        } else {
            FrameSpec::from_element(element, geometry)
        };
        let node = host.create_frame(&frame)?;

        if let Some(text) = element.text.as_deref().filter(|text| !text.is_empty()) {
            let spec = if lightweight {
                TextSpec::lightweight(text)
            } else {
                let font = resolve_element_font(element, report);
                TextSpec::from_element(element, text, &font)
            };
            match host.create_text(&spec) {
                Ok(text_node) => {
                    if let Err(e) = host.append_child(Some(&node), &text_node) {
                        host.remove(&text_node);
                        report.add_error(&node_error(index, element, e));
                    }
                }
                Err(e) => report.add_error(&node_error(index, element, e)),
            }
        }

        Ok(node)
    }
}

fn nearest_created<N>(items: &[Item<'_>], created: &[Option<N>], index: usize) -> Option<usize> {
    let mut current = items[index].parent;
    while let Some(candidate) = current {
        if created[candidate].is_some() {
            return Some(candidate);
        }
        current = items[candidate].parent;
    }
    None
}

fn progress_percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (processed as f64 / total as f64 * 100.0).round() as u8
}

fn resolve_element_font(element: &CaptureElement, report: &mut ImportReport) -> ResolvedFont {
    let Some(stack) = element.style("font-family").filter(|stack| !stack.trim().is_empty()) else {
        return ResolvedFont { name: DEFAULT_FONT.to_string(), substituted: false };
    };
    let font = resolve_font_name(stack);
    if font.substituted {
        report.record_substitution(stack, &font.name);
    }
    font
}

fn check_image(doc: &CaptureDocument, index: usize, element: &CaptureElement, report: &mut ImportReport) {
    let src = element.src.as_deref().unwrap_or_default();
    match classify_image(src, &doc.url) {
        ImageStatus::Ok => {}
        ImageStatus::CorsIssue => {
            report.add_cors_warning(node_error(index, element, format!("{src} may be blocked by CORS")).to_string());
        }
        ImageStatus::Missing => {
            report.add_error(&node_error(index, element, "image has no src"));
        }
    }
}
