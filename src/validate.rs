//! Structural validation of untrusted capture documents.
//!
//! Every field the rebuild stage relies on is checked against
//! [`DOCUMENT_SCHEMA`] before the payload is converted into a
//! [`CaptureDocument`]. Nothing is coerced; the first violation rejects the
//! whole document.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::capture::document::{CAPTURE_VERSION, CaptureDocument};
use crate::error::{PipelineError, Result};

/// Why a payload is not a capture document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("{path} must be an object")]
    NotAnObject { path: String },

    #[error("{path} is missing")]
    Missing { path: String },

    #[error("Unsupported version {found}, expected \"1.0\"")]
    UnsupportedVersion { found: String },

    #[error("{path} must be a string")]
    NotAString { path: String },

    #[error("{path} must be an array")]
    NotAnArray { path: String },

    #[error("{path} has svgContent but its tagName is \"{tag}\"")]
    SvgContentOnNonSvg { path: String, tag: String },

    #[error("{path} has svgContent and children")]
    SvgWithChildren { path: String },

    #[error("{reason}")]
    Malformed { reason: String },
}

/// Check applied to one top-level field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// A string equal to the given literal
    Literal(&'static str),
    String,
    /// Any object; its members are not inspected
    Object,
    /// The recursive element shape
    Element,
}

/// Top-level fields of a capture document and the rule each must satisfy
pub const DOCUMENT_SCHEMA: [(&str, Rule); 5] = [
    ("version", Rule::Literal(CAPTURE_VERSION)),
    ("timestamp", Rule::String),
    ("url", Rule::String),
    ("viewport", Rule::Object),
    ("element", Rule::Element),
];

/// Validate `raw` and convert it into a [`CaptureDocument`]
pub fn validate(raw: Value) -> std::result::Result<CaptureDocument, SchemaViolation> {
    let object = as_document_object(&raw)?;
    for (field, rule) in DOCUMENT_SCHEMA {
        check_field(object, field, rule)?;
    }

    serde_json::from_value(raw).map_err(|e| SchemaViolation::Malformed { reason: e.to_string() })
}

/// Every top-level violation of `raw`, in schema order; empty when `raw` is valid.
///
/// The element tree contributes at most its first violation.
pub fn validation_errors(raw: &Value) -> Vec<SchemaViolation> {
    let object = match as_document_object(raw) {
        Ok(object) => object,
        Err(violation) => return vec![violation],
    };

    let mut violations: Vec<SchemaViolation> = DOCUMENT_SCHEMA
        .iter()
        .filter_map(|(field, rule)| check_field(object, field, *rule).err())
        .collect();

    if violations.is_empty() {
        if let Err(e) = serde_json::from_value::<CaptureDocument>(raw.clone()) {
            violations.push(SchemaViolation::Malformed { reason: e.to_string() });
        }
    }
    violations
}

/// Deepest array/object nesting accepted from untrusted text.
///
/// Each element level costs two (the element object and its `children`
/// array), so this leaves room for a chain well past the node limit while
/// keeping the recursive parser and deserializer within the stack.
pub const MAX_JSON_DEPTH: usize = 256;

/// Parse JSON text into a [`Value`] without serde_json's fixed recursion
/// limit, refusing input nested deeper than [`MAX_JSON_DEPTH`]
pub fn parse_value(text: &str) -> Result<Value> {
    let depth = nesting_depth(text);
    if depth > MAX_JSON_DEPTH {
        return Err(PipelineError::Parse(format!(
            "nesting depth {} exceeds the limit of {}",
            depth, MAX_JSON_DEPTH
        )));
    }

    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(&mut deserializer).map_err(|e| PipelineError::Parse(e.to_string()))?;
    deserializer.end().map_err(|e| PipelineError::Parse(e.to_string()))?;
    Ok(value)
}

/// Maximum bracket depth outside string literals. Malformed text is left
/// for the parser to report.
fn nesting_depth(text: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in text.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Parse JSON text and validate it
pub fn parse_json(text: &str) -> Result<CaptureDocument> {
    let raw = parse_value(text)?;
    validate(raw).map_err(|violation| {
        log::warn!("Rejected capture document: {}", violation);
        PipelineError::Schema(violation)
    })
}

fn as_document_object(raw: &Value) -> std::result::Result<&Map<String, Value>, SchemaViolation> {
    raw.as_object()
        .ok_or_else(|| SchemaViolation::NotAnObject { path: "$".to_string() })
}

fn check_field(object: &Map<String, Value>, field: &str, rule: Rule) -> std::result::Result<(), SchemaViolation> {
    let Some(value) = object.get(field) else {
        return Err(SchemaViolation::Missing { path: field.to_string() });
    };

    match rule {
        Rule::Literal(expected) => match value.as_str() {
            Some(found) if found == expected => Ok(()),
            Some(found) => Err(SchemaViolation::UnsupportedVersion { found: format!("\"{found}\"") }),
            None => Err(SchemaViolation::UnsupportedVersion { found: value.to_string() }),
        },
        Rule::String if value.is_string() => Ok(()),
        Rule::String => Err(SchemaViolation::NotAString { path: field.to_string() }),
        Rule::Object if value.is_object() => Ok(()),
        Rule::Object => Err(SchemaViolation::NotAnObject { path: field.to_string() }),
        Rule::Element => check_element_tree(value, field),
    }
}

/// Walk the element tree without recursion so deep payloads cannot
/// exhaust the stack
fn check_element_tree(root: &Value, root_path: &str) -> std::result::Result<(), SchemaViolation> {
    let mut stack: Vec<(String, &Value)> = vec![(root_path.to_string(), root)];

    while let Some((path, value)) = stack.pop() {
        let Some(element) = value.as_object() else {
            return Err(SchemaViolation::NotAnObject { path });
        };

        let tag = match element.get("tagName") {
            Some(Value::String(tag)) => tag.as_str(),
            Some(_) => return Err(SchemaViolation::NotAString { path: format!("{path}.tagName") }),
            None => return Err(SchemaViolation::Missing { path: format!("{path}.tagName") }),
        };

        let children = match element.get("children") {
            Some(Value::Array(children)) => children,
            Some(_) => return Err(SchemaViolation::NotAnArray { path: format!("{path}.children") }),
            None => return Err(SchemaViolation::Missing { path: format!("{path}.children") }),
        };

        if let Some(svg_content) = element.get("svgContent") {
            if !svg_content.is_string() {
                return Err(SchemaViolation::NotAString { path: format!("{path}.svgContent") });
            }
            if !tag.eq_ignore_ascii_case("svg") {
                return Err(SchemaViolation::SvgContentOnNonSvg { path, tag: tag.to_string() });
            }
            if !children.is_empty() {
                return Err(SchemaViolation::SvgWithChildren { path });
            }
        }

        // Reversed so children are checked in document order
        for (i, child) in children.iter().enumerate().rev() {
            stack.push((format!("{path}.children[{i}]"), child));
        }
    }

    Ok(())
}
