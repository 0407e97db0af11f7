//! Response extraction — pulls the JSON object out of free-form model text.
//!
//! Best effort, not repair: a direct parse of the trimmed text, then a single
//! retry on the span from the first `{` to the last `}`. Anything else is
//! `Unparsed`.

use serde_json::{Map, Value};

/// Outcome of extracting a JSON object from model output.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Parsed(Map<String, Value>),
    Unparsed,
}

impl Extracted {
    /// Lifts an arbitrary JSON value; only objects count as parsed.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Extracted::Parsed(map),
            _ => Extracted::Unparsed,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Extracted::Parsed(_))
    }
}

/// Locates and parses the first JSON object in `raw_text`. Never fails.
pub fn extract_json(raw_text: &str) -> Extracted {
    let text = raw_text.trim();
    if text.is_empty() {
        return Extracted::Unparsed;
    }

    if text.starts_with('{') && text.ends_with('}') {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return Extracted::from_value(value);
        }
    }

    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Extracted::Unparsed;
    };
    if end <= start {
        return Extracted::Unparsed;
    }

    // Both braces are ASCII, so the byte span is on char boundaries.
    serde_json::from_str::<Value>(&text[start..=end])
        .map(Extracted::from_value)
        .unwrap_or(Extracted::Unparsed)
}
