use serde::{Deserialize, Serialize};

/// Font used when no family of a stack is available
pub const DEFAULT_FONT: &str = "Inter";

/// Web font family to the design-tool font that stands in for it
const FONT_FALLBACKS: &[(&str, &str)] = &[
    // System fonts
    ("system-ui", "Inter"),
    ("-apple-system", "Inter"),
    ("BlinkMacSystemFont", "Inter"),
    ("Segoe UI", "Segoe UI"),
    ("Helvetica Neue", "Helvetica Neue"),
    ("Arial", "Arial"),
    ("Helvetica", "Helvetica"),
    ("sans-serif", "Inter"),
    ("serif", "Georgia"),
    ("monospace", "Roboto Mono"),
    // Google Fonts
    ("Roboto", "Roboto"),
    ("Open Sans", "Open Sans"),
    ("Lato", "Lato"),
    ("Montserrat", "Montserrat"),
    ("Oswald", "Oswald"),
    ("Source Sans Pro", "Source Sans Pro"),
    ("Raleway", "Raleway"),
    ("PT Sans", "PT Sans"),
    ("Nunito", "Nunito"),
    ("Poppins", "Poppins"),
    // Serif
    ("Georgia", "Georgia"),
    ("Times New Roman", "Times New Roman"),
    ("Merriweather", "Merriweather"),
    // Monospace
    ("Courier New", "Courier New"),
    ("Roboto Mono", "Roboto Mono"),
    ("Source Code Pro", "Source Code Pro"),
    ("Fira Code", "Fira Code"),
];

/// Outcome of resolving a CSS font stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFont {
    pub name: String,
    /// True when the resolved font differs from the family the page asked for
    pub substituted: bool,
}

/// Look up the stand-in for a single family name (exact, case-sensitive)
pub fn fallback_for(family: &str) -> Option<&'static str> {
    FONT_FALLBACKS
        .iter()
        .find(|(web, _)| *web == family)
        .map(|(_, target)| *target)
}

/// Split a `font-family` value into unquoted candidates, in stack order
pub fn font_candidates(stack: &str) -> impl Iterator<Item = &str> {
    stack.split(',').map(|candidate| {
        let candidate = candidate.trim();
        let candidate = candidate
            .strip_prefix(['"', '\''])
            .unwrap_or(candidate);
        candidate.strip_suffix(['"', '\'']).unwrap_or(candidate)
    })
}

/// Resolve a CSS font stack to the first candidate with a known stand-in.
///
/// Candidates are tried strictly in order; a later candidate is never
/// preferred over an earlier match.
pub fn resolve_font_name(stack: &str) -> ResolvedFont {
    font_candidates(stack)
        .find_map(|candidate| {
            fallback_for(candidate).map(|target| ResolvedFont {
                name: target.to_string(),
                substituted: target != candidate,
            })
        })
        .unwrap_or_else(|| ResolvedFont {
            name: DEFAULT_FONT.to_string(),
            substituted: true,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_table() {
        assert_eq!(fallback_for("system-ui"), Some("Inter"));
        assert_eq!(fallback_for("Arial"), Some("Arial"));
        assert_eq!(fallback_for("Poppins"), Some("Poppins"));
        assert_eq!(fallback_for("arial"), None);
    }

    #[test]
    fn test_resolves_known_font_directly() {
        assert_eq!(
            resolve_font_name("Roboto"),
            ResolvedFont { name: "Roboto".into(), substituted: false }
        );
    }

    #[test]
    fn test_resolves_through_stack() {
        assert_eq!(
            resolve_font_name("\"Unknown Font\", Arial, sans-serif"),
            ResolvedFont { name: "Arial".into(), substituted: false }
        );
    }

    #[test]
    fn test_earlier_match_wins() {
        // sans-serif is substituted, Roboto would be exact, but order decides
        let resolved = resolve_font_name("sans-serif, Roboto");
        assert_eq!(resolved.name, "Inter");
        assert!(resolved.substituted);
    }

    #[test]
    fn test_unknown_font_falls_back() {
        assert_eq!(
            resolve_font_name("\"My Custom Font\""),
            ResolvedFont { name: "Inter".into(), substituted: true }
        );
        assert_eq!(resolve_font_name("").name, "Inter");
    }

    #[test]
    fn test_strips_quotes() {
        assert_eq!(resolve_font_name("'Open Sans', serif").name, "Open Sans");
        assert_eq!(resolve_font_name("\"Roboto\"").name, "Roboto");

        let candidates: Vec<&str> = font_candidates(" 'Fira Code' ,monospace").collect();
        assert_eq!(candidates, vec!["Fira Code", "monospace"]);
    }

    #[test]
    fn test_system_ui_is_substituted() {
        let resolved = resolve_font_name("system-ui");
        assert_eq!(resolved.name, "Inter");
        assert!(resolved.substituted);
    }
}
