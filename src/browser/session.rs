use crate::{browser::config::{ConnectionOptions, LaunchOptions},
            capture::{CaptureOutcome, HtmlSanitizer, PageSnapshot, Sanitizer, capture_element},
            config::CaptureOptions,
            error::{PipelineError, Result},
            validate::parse_value};
use headless_chrome::{Browser, Tab};
use serde_json::Value;
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// Browser session that manages a Chrome/Chromium instance
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Pages that detect automation may render differently
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // Picking an element can take a while; the default idle timeout is 30 seconds
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| PipelineError::LaunchFailed(e.to_string()))?;

        browser
            .new_tab()
            .map_err(|e| PipelineError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        Ok(Self { browser })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect(options.ws_url).map_err(|e| PipelineError::ConnectionFailed(e.to_string()))?;

        Ok(Self { browser })
    }

    /// Launch a browser with default options
    pub fn new() -> Result<Self> {
        Self::launch(LaunchOptions::default())
    }

    /// Get the active tab
    pub fn tab(&self) -> Result<Arc<Tab>> {
        self.get_active_tab()
    }

    pub fn new_tab(&mut self) -> Result<Arc<Tab>> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| PipelineError::TabOperationFailed(format!("Failed to create tab: {}", e)))?;
        Ok(tab)
    }

    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| PipelineError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    /// Get the currently active tab by checking the document visibility and focus state
    pub fn get_active_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.get_tabs()?;

        // Visible and focused first, then visible only
        for check in [
            "document.visibilityState === 'visible' && document.hasFocus()",
            "document.visibilityState === 'visible'",
        ] {
            for tab in &tabs {
                match tab.evaluate(check, false) {
                    Ok(remote_object) => {
                        if remote_object.value.as_ref().and_then(Value::as_bool).unwrap_or(false) {
                            return Ok(tab.clone());
                        }
                    }
                    Err(e) => log::debug!("Failed to check tab status: {}", e),
                }
            }
        }

        Err(PipelineError::TabOperationFailed("No active tab found".to_string()))
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Navigate to a URL using the active tab
    pub fn navigate(&self, url: &str) -> Result<()> {
        self.tab()?
            .navigate_to(url)
            .map_err(|e| PipelineError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        Ok(())
    }

    /// Wait for navigation to complete
    pub fn wait_for_navigation(&self) -> Result<()> {
        self.tab()?
            .wait_until_navigated()
            .map_err(|e| PipelineError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Wait until an element matching `css_selector` is present
    pub fn wait_for_element(&self, css_selector: &str) -> Result<()> {
        self.tab()?
            .wait_for_element(css_selector)
            .map_err(|e| PipelineError::ElementNotFound(format!("Element '{}' not found: {}", css_selector, e)))?;

        Ok(())
    }

    /// Read the subtree matching `css_selector` out of the active tab.
    ///
    /// The element count is checked in the page, so oversized subtrees are
    /// refused before their styles are read.
    pub fn snapshot(&self, css_selector: &str, max_elements: usize) -> Result<PageSnapshot> {
        let script = include_str!("capture_snapshot.js");
        let selector = serde_json::to_string(css_selector)?;
        let expression = format!("{}({}, {})", script.trim_end(), selector, max_elements);

        let result = self
            .tab()?
            .evaluate(&expression, false)
            .map_err(|e| PipelineError::EvaluationFailed(format!("Failed to execute capture script: {}", e)))?;

        let json_value = result
            .value
            .ok_or_else(|| PipelineError::EvaluationFailed("No value returned from capture script".to_string()))?;

        // The script returns a JSON string
        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| PipelineError::EvaluationFailed(format!("Failed to get JSON string: {}", e)))?;

        let raw = parse_value(&json_str)
            .map_err(|e| PipelineError::EvaluationFailed(format!("Failed to parse capture JSON: {}", e)))?;

        match raw.get("error").and_then(Value::as_str) {
            Some("not_found") => Err(PipelineError::ElementNotFound(css_selector.to_string())),
            Some("limit") => {
                let count = raw.get("count").and_then(Value::as_u64).unwrap_or_default() as usize;
                log::warn!("Subtree '{}' has {} elements, limit is {}", css_selector, count, max_elements);
                Err(PipelineError::ElementLimitExceeded { count, limit: max_elements })
            }
            Some(other) => Err(PipelineError::EvaluationFailed(format!("Capture script failed: {}", other))),
            None => serde_json::from_value(raw)
                .map_err(|e| PipelineError::EvaluationFailed(format!("Unexpected capture snapshot: {}", e))),
        }
    }

    /// Capture the subtree matching `css_selector` in the active tab
    pub fn capture<S: HtmlSanitizer>(
        &self,
        css_selector: &str,
        sanitizer: &Sanitizer<S>,
        options: &CaptureOptions,
    ) -> Result<CaptureOutcome> {
        let snapshot = self.snapshot(css_selector, options.max_elements)?;
        log::debug!("Snapshot of '{}' taken from {}", css_selector, snapshot.url);
        capture_element(&snapshot, &snapshot.root, sanitizer, options)
    }

    /// Close every tab; the browser process exits when the session is dropped
    pub fn close(&self) -> Result<()> {
        let tabs = self.get_tabs()?;
        for tab in tabs {
            if let Err(e) = tab.close(false) {
                log::debug!("Failed to close tab: {}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PolicySanitizer;

    #[test]
    fn test_launch_options_builder() {
        let opts = LaunchOptions::new().headless(true).window_size(800, 600).sandbox(false);

        assert!(opts.headless);
        assert!(!opts.sandbox);
        assert_eq!(opts.window_width, 800);
        assert_eq!(opts.window_height, 600);
    }

    #[test]
    fn test_connection_options() {
        let opts = ConnectionOptions::new("ws://localhost:9222").timeout(5000);

        assert_eq!(opts.ws_url, "ws://localhost:9222");
        assert_eq!(opts.timeout, 5000);
    }

    #[test]
    fn test_snapshot_script_is_a_function_expression() {
        let script = include_str!("capture_snapshot.js").trim_end();
        assert!(script.starts_with("(function (selector, maxElements)"));
        assert!(script.ends_with(')'));
    }

    // Integration tests (require Chrome to be installed)
    #[test]
    #[ignore] // Ignore by default, run with: cargo test -- --ignored
    fn test_launch_browser() {
        let result = BrowserSession::launch(LaunchOptions::new().headless(true));
        assert!(result.is_ok());
    }

    #[test]
    #[ignore]
    fn test_capture_missing_selector() {
        let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
        session.navigate("about:blank").expect("Failed to navigate");

        let result = session.capture("#nope", &Sanitizer::new(PolicySanitizer), &CaptureOptions::default());
        assert!(matches!(result, Err(PipelineError::ElementNotFound(_))));
    }
}
