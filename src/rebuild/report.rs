use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// A font the design tool used in place of the one the page asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FontSubstitution {
    /// The element's `font-family` value
    pub original: String,
    pub replacement: String,
}

/// Outcome of a rebuild, accumulated node by node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total_elements: usize,
    pub fonts_substituted: Vec<FontSubstitution>,
    pub cors_warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ImportReport {
    pub fn new(total_elements: usize) -> Self {
        Self { total_elements, ..Default::default() }
    }

    /// Record a substitution once per distinct pair
    pub fn record_substitution(&mut self, original: &str, replacement: &str) {
        let seen = self
            .fonts_substituted
            .iter()
            .any(|s| s.original == original && s.replacement == replacement);
        if !seen {
            self.fonts_substituted.push(FontSubstitution {
                original: original.to_string(),
                replacement: replacement.to_string(),
            });
        }
    }

    pub fn add_cors_warning(&mut self, warning: impl Into<String>) {
        self.cors_warnings.push(warning.into());
    }

    pub fn add_error(&mut self, error: &PipelineError) {
        self.errors.push(error.to_string());
    }

    /// No errors and no warnings
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.cors_warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutions_are_deduplicated_in_order() {
        let mut report = ImportReport::new(3);
        report.record_substitution("Helvetica", "Inter");
        report.record_substitution("\"Fira Code\", monospace", "Roboto Mono");
        report.record_substitution("Helvetica", "Inter");

        let originals: Vec<&str> = report.fonts_substituted.iter().map(|s| s.original.as_str()).collect();
        assert_eq!(originals, vec!["Helvetica", "\"Fira Code\", monospace"]);
    }

    #[test]
    fn test_errors_use_node_format() {
        let mut report = ImportReport::new(1);
        report.add_error(&PipelineError::Node {
            index: 4,
            tag: "img".into(),
            reason: "image has no src".into(),
        });
        assert_eq!(report.errors, vec!["img#4: image has no src"]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_wire_field_names() {
        let value = serde_json::to_value(ImportReport::new(2)).unwrap();
        assert_eq!(value["totalElements"], 2);
        assert!(value["fontsSubstituted"].is_array());
        assert!(value["corsWarnings"].is_array());
        assert!(value["errors"].is_array());
    }
}
