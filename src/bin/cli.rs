//! html-to-figma command line
//!
//! Captures an element from a page through headless Chrome, validates
//! capture documents, and dry-runs imports against an in-memory design host.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use html_to_figma::browser::{BrowserSession, ConnectionOptions, LaunchOptions};
use html_to_figma::capture::{PolicySanitizer, Sanitizer, capture_schema};
use html_to_figma::config::CaptureOptions;
use html_to_figma::message::{ImportRequest, import_json};
use html_to_figma::rebuild::{RecordingHost, TokioScheduler};
use html_to_figma::validate::{parse_value, validation_errors};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "html-to-figma")]
#[command(version)]
#[command(about = "Capture DOM subtrees and rebuild them as design-tool nodes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture the element matching a selector into a JSON document
    Capture {
        /// Page to open
        #[arg(long)]
        url: String,

        /// CSS selector of the element to capture
        #[arg(long, default_value = "body")]
        selector: String,

        /// Write the document here instead of stdout
        #[arg(long, short = 'o', value_name = "FILE")]
        out: Option<PathBuf>,

        /// Launch browser in headed mode (default: headless)
        #[arg(long, short = 'H')]
        headed: bool,

        /// Path to custom browser executable
        #[arg(long, value_name = "PATH")]
        executable_path: Option<String>,

        /// WebSocket endpoint URL for remote browser connection
        #[arg(long, value_name = "URL")]
        ws_endpoint: Option<String>,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,

        /// Also write the sanitized markup of the element here
        #[arg(long, value_name = "FILE")]
        sanitized_html: Option<PathBuf>,
    },

    /// Check a capture document and list every violation
    Validate {
        file: PathBuf,
    },

    /// Rebuild a capture document against an in-memory host and print the report
    Import {
        file: PathBuf,

        /// Apply structure and geometry only
        #[arg(long)]
        lightweight: bool,

        /// Print the recorded node tree after the report
        #[arg(long)]
        tree: bool,
    },

    /// Print the JSON Schema of the capture document format
    Schema,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Capture {
            url,
            selector,
            out,
            headed,
            executable_path,
            ws_endpoint,
            compact,
            sanitized_html,
        } => {
            let session = match ws_endpoint {
                Some(ws) => BrowserSession::connect(ConnectionOptions::new(ws))?,
                None => {
                    let mut options = LaunchOptions::new().headless(!headed);
                    if let Some(path) = executable_path {
                        options = options.chrome_path(path);
                    }
                    BrowserSession::launch(options)?
                }
            };

            session.navigate(&url)?;
            session.wait_for_navigation()?;
            session.wait_for_element(&selector)?;

            let options = CaptureOptions::new().pretty(!compact);
            let outcome = session.capture(&selector, &Sanitizer::new(PolicySanitizer), &options)?;

            for warning in &outcome.warnings {
                eprintln!("warning: {}", warning);
            }

            if let Some(path) = sanitized_html {
                tokio::fs::write(&path, &outcome.sanitized_html)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }

            match out {
                Some(path) => {
                    tokio::fs::write(&path, &outcome.json)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!(
                        "Captured {} elements into {}",
                        outcome.document.count_elements(),
                        path.display()
                    );
                }
                None => println!("{}", outcome.json),
            }
        }

        Command::Validate { file } => {
            let text = read(&file).await?;
            let raw = parse_value(&text).with_context(|| format!("{} is not valid JSON", file.display()))?;

            let violations = validation_errors(&raw);
            if violations.is_empty() {
                println!("{}: valid", file.display());
            } else {
                for violation in &violations {
                    println!("{}: {}", file.display(), violation);
                }
                bail!("{} violation(s) found", violations.len());
            }
        }

        Command::Import { file, lightweight, tree } => {
            let request = ImportRequest::new(read(&file).await?).lightweight(lightweight);
            let mut host = RecordingHost::new();

            let result = import_json(&request, &mut host, &mut TokioScheduler, None, |message| {
                match serde_json::to_string(&message) {
                    Ok(line) => println!("{}", line),
                    Err(e) => log::warn!("Failed to encode message: {}", e),
                }
            })
            .await;

            if tree {
                println!("{}", serde_json::to_string_pretty(&host.tree())?);
            }
            result?;
        }

        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&capture_schema())?);
        }
    }

    Ok(())
}

async fn read(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}
