use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::NestedMap;
use crate::stringify::stringify;

/// Source key whose data is never rendered as a field.
pub const EXCEPTION_KEY: &str = "exception";

/// One titled row inside an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    /// Rendered side by side with other short fields when `true`.
    pub short: bool,
}

impl AttachmentField {
    /// Full-width field with the title derived from a source key.
    pub fn new(key: &str, value: impl Into<String>) -> Self {
        AttachmentField {
            title: title_case(key),
            value: value.into(),
            short: false,
        }
    }
}

/// Turn a mapping into attachment fields, in the mapping's order.
///
/// Containers are stringified (which normalizes them) and fenced in a
/// code block; scalars are rendered as plain text. The `exception` key is
/// skipped.
pub fn fields_from(data: &NestedMap) -> Vec<AttachmentField> {
    data.iter()
        .filter(|(key, _)| key.as_str() != EXCEPTION_KEY)
        .map(|(key, value)| AttachmentField::new(key, render_value(value)))
        .collect()
}

/// Concatenate the fields of `extra` and `context`, in that order.
pub fn record_fields(extra: &NestedMap, context: &NestedMap) -> Vec<AttachmentField> {
    let mut fields = Vec::new();
    for data in [extra, context] {
        if data.is_empty() {
            continue;
        }
        fields.extend(fields_from(data));
    }
    fields
}

/// Wrap text in the chat's monospace code-block marker.
pub fn fenced(text: &str) -> String {
    format!("```{}```", text)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => fenced(&stringify(value)),
        Value::String(s) => s.clone(),
        Value::Null | Value::Bool(_) | Value::Number(_) => value.to_string(),
    }
}

fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
