//! # html-to-figma
//!
//! Capture a DOM subtree from a live page into a portable JSON document, and
//! rebuild it as a node tree in a visual design tool.
//!
//! ## Pipeline
//!
//! live element → [`capture`] (+ sanitizer) → [`CaptureDocument`] →
//! [`serialize`] → JSON → [`validate`] → [`rebuild`] → node tree + [`ImportReport`]
//!
//! - The capture refuses subtrees of more than 100 elements and serialized
//!   documents of more than 2 MiB.
//! - The validator is the only place untrusted JSON is accepted.
//! - The rebuild creates nodes in batches of 50 and yields to the host
//!   between batches.
//!
//! ## Capturing from Chrome
//!
//! ```rust,no_run
//! use html_to_figma::{BrowserSession, CaptureOptions, LaunchOptions, PolicySanitizer, Sanitizer};
//!
//! # fn main() -> html_to_figma::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! session.navigate("https://example.com")?;
//! session.wait_for_navigation()?;
//!
//! let outcome = session.capture("body", &Sanitizer::new(PolicySanitizer), &CaptureOptions::default())?;
//! println!("{} elements, {} bytes", outcome.document.count_elements(), outcome.json.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Rebuilding
//!
//! ```rust,no_run
//! use html_to_figma::rebuild::{ChunkedRebuilder, ImmediateScheduler, RecordingHost};
//!
//! # async fn run(json: &str) -> html_to_figma::Result<()> {
//! let doc = html_to_figma::parse_json(json)?;
//! let mut host = RecordingHost::new();
//! let report = ChunkedRebuilder::default()
//!     .rebuild(&doc, &mut host, &mut ImmediateScheduler::new(), |percent| println!("{percent}%"))
//!     .await?;
//! println!("{} elements, {} errors", report.total_elements, report.errors.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`capture`]: host seams, tree capture, sanitization and page snapshots
//! - [`serialize`]: size-capped JSON output
//! - [`validate`]: structural validation of untrusted documents
//! - [`mapping`]: CSS value, font and image decisions
//! - [`rebuild`]: chunked node creation and import reports
//! - [`message`]: progress/report protocol and the import driver
//! - [`picker`]: element picker state machine
//! - [`browser`]: headless Chrome capture host
//! - [`error`]: error types and result aliases

pub mod browser;
pub mod capture;
pub mod config;
pub mod error;
pub mod mapping;
pub mod message;
pub mod picker;
pub mod rebuild;
pub mod serialize;
pub mod validate;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use capture::{
    CaptureDocument, CaptureElement, CaptureHost, CaptureOutcome, LiveElement, PageSnapshot, PolicySanitizer,
    Sanitizer, capture_element,
};
pub use config::{CaptureOptions, RebuildOptions};
pub use error::{PipelineError, Result};
pub use message::{ImportRequest, PluginMessage, import_json};
pub use rebuild::{ChunkedRebuilder, DesignHost, ImportReport, Scheduler};
pub use serialize::to_json;
pub use validate::{SchemaViolation, parse_json, validate};
