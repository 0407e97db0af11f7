//! Field normalization — coerces untrusted model JSON into a stage's schema.
//!
//! Output always carries exactly the declared fields with their declared kinds.
//! Malformed output is absorbed here and never surfaces as an error.

use serde_json::{Map, Value};

use crate::planner::extract::Extracted;
use crate::planner::state::StageOutput;

/// Written to a stage's diagnostic field when no JSON object could be extracted.
pub const INVALID_JSON_MESSAGE: &str = "Model returned invalid JSON.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    List,
}

impl FieldKind {
    fn empty(self) -> Value {
        match self {
            FieldKind::Text => Value::String(String::new()),
            FieldKind::List => Value::Array(Vec::new()),
        }
    }
}

/// Expected output shape of one stage.
#[derive(Debug)]
pub struct StageSchema {
    pub fields: &'static [(&'static str, FieldKind)],
    /// Text field that carries `INVALID_JSON_MESSAGE` on unparsed output.
    pub diagnostic_field: &'static str,
}

/// Normalizes `extracted` against `schema`.
pub fn normalize(extracted: &Extracted, schema: &StageSchema) -> StageOutput {
    let mut out = Map::new();

    match extracted {
        Extracted::Parsed(data) => {
            for &(name, kind) in schema.fields {
                out.insert(name.to_string(), coerce(data.get(name), kind));
            }
        }
        Extracted::Unparsed => {
            for &(name, kind) in schema.fields {
                let value = if name == schema.diagnostic_field && kind == FieldKind::Text {
                    Value::String(INVALID_JSON_MESSAGE.to_string())
                } else {
                    kind.empty()
                };
                out.insert(name.to_string(), value);
            }
        }
    }

    StageOutput::from(out)
}

fn coerce(value: Option<&Value>, kind: FieldKind) -> Value {
    match (kind, value) {
        (FieldKind::Text, Some(Value::String(s))) => Value::String(s.clone()),
        (FieldKind::Text, _) => kind.empty(),
        (FieldKind::List, Some(Value::Array(items))) => Value::Array(items.clone()),
        (FieldKind::List, None | Some(Value::Null)) => kind.empty(),
        (FieldKind::List, Some(other)) => Value::Array(vec![other.clone()]),
    }
}
