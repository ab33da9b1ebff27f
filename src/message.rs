//! Messages exchanged between the import UI and the rebuild driver

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::RebuildOptions;
use crate::error::Result;
use crate::rebuild::{ChunkedRebuilder, DesignHost, ImportReport, Scheduler};
use crate::validate::parse_json;

/// Request to import a serialized capture document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub json: String,
    #[serde(default)]
    pub lightweight: bool,
}

impl ImportRequest {
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into(), lightweight: false }
    }

    pub fn lightweight(mut self, lightweight: bool) -> Self {
        self.lightweight = lightweight;
        self
    }
}

/// Messages sent from the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiMessage {
    ImportJson(ImportRequest),
}

/// Messages sent back to the UI while an import runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PluginMessage {
    Progress { percent: u8 },
    ImportSuccess { report: ImportReport },
    ImportError { message: String },
}

impl PluginMessage {
    /// Whether this message ends an import
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// Parse, validate and rebuild the document in `request`.
///
/// `sink` receives zero or more `PROGRESS` messages followed by exactly one
/// `IMPORT_SUCCESS` or `IMPORT_ERROR`.
pub async fn import_json<H, S, F>(
    request: &ImportRequest,
    host: &mut H,
    scheduler: &mut S,
    cancel: Option<CancellationToken>,
    mut sink: F,
) -> Result<ImportReport>
where
    H: DesignHost,
    S: Scheduler,
    F: FnMut(PluginMessage) + Send,
{
    let options = RebuildOptions::new().lightweight(request.lightweight);
    let mut rebuilder = ChunkedRebuilder::new(options);
    if let Some(token) = cancel {
        rebuilder = rebuilder.with_cancellation(token);
    }

    let result = match parse_json(&request.json) {
        Ok(doc) => {
            rebuilder
                .rebuild(&doc, host, scheduler, |percent| sink(PluginMessage::Progress { percent }))
                .await
        }
        Err(e) => Err(e),
    };

    match &result {
        Ok(report) => sink(PluginMessage::ImportSuccess { report: report.clone() }),
        Err(e) => {
            log::warn!("Import failed: {}", e);
            sink(PluginMessage::ImportError { message: e.to_string() });
        }
    }
    result
}
