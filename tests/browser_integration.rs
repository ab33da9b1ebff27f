use html_to_figma::capture::{PolicySanitizer, Sanitizer};
use html_to_figma::config::CaptureOptions;
use html_to_figma::{BrowserSession, LaunchOptions, PipelineError, parse_json};

fn data_url(html: &str) -> String {
    format!("data:text/html,{}", urlencoding::encode(html))
}

fn open(html: &str) -> BrowserSession {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true).window_size(1024, 768))
        .expect("Failed to launch browser");
    session.navigate(&data_url(html)).expect("Failed to navigate");
    session.wait_for_navigation().expect("Navigation did not finish");
    session
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_capture_card() {
    let session = open(
        r#"<html><body>
            <div id="card" style="display:flex;gap:8px;padding:12px;background:#fafafa" data-token="secret-1">
                <h2 aria-label="Card title">Hello</h2>
                <img src="data:image/png;base64,iVBORw0KGgo=" width="10" height="10">
                <svg width="10" height="10"><circle cx="5" cy="5" r="4"></circle></svg>
                <button onclick="alert(1)">Go</button>
            </div>
        </body></html>"#,
    );

    let outcome = session
        .capture("#card", &Sanitizer::new(PolicySanitizer), &CaptureOptions::default())
        .expect("Failed to capture");

    let doc = &outcome.document;
    assert_eq!(doc.element.tag_name, "div");
    assert_eq!(doc.element.id, "card");
    assert_eq!(doc.element.style("display"), Some("flex"));
    assert_eq!(doc.count_elements(), 5);

    let svg = &doc.element.children[2];
    assert!(svg.children.is_empty());
    assert!(svg.svg_content.as_deref().unwrap_or_default().contains("<circle"));

    assert_eq!(
        doc.element.children[0].accessibility.as_ref().and_then(|a| a.label.as_deref()),
        Some("Card title")
    );

    assert!(!outcome.sanitized_html.contains("secret-1"));
    assert!(!outcome.sanitized_html.contains("onclick"));
    assert!(outcome.warnings.is_empty());

    assert_eq!(&parse_json(&outcome.json).expect("Capture must validate"), doc);
}

#[test]
#[ignore]
fn test_capture_refuses_large_subtree() {
    let items: String = (0..150).map(|i| format!("<li>{i}</li>")).collect();
    let session = open(&format!("<html><body><ul id=\"list\">{items}</ul></body></html>"));

    let result = session.capture("#list", &Sanitizer::new(PolicySanitizer), &CaptureOptions::default());
    assert!(matches!(result, Err(PipelineError::ElementLimitExceeded { count: 151, limit: 100 })));
}

#[test]
#[ignore]
fn test_capture_unknown_selector() {
    let session = open("<html><body><p>Hi</p></body></html>");

    let result = session.capture("#missing", &Sanitizer::new(PolicySanitizer), &CaptureOptions::default());
    assert!(matches!(result, Err(PipelineError::ElementNotFound(_))));
}
