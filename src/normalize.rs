//! Reduction of host data into the canonical [`NestedValue`] shape.
//!
//! Every value rendered into a webhook field goes through [`normalize`]
//! first, which bounds how deep and how wide the rendered structure can get.

use serde::Serialize;
use serde_json::Value;

/// Canonical value shape: null, bool, number, string, sequence or mapping.
pub type NestedValue = Value;

/// Ordered string-keyed mapping of nested values.
pub type NestedMap = serde_json::Map<String, Value>;

/// Containers nested deeper than this are replaced by a marker string.
pub const MAX_NORMALIZE_DEPTH: usize = 9;

/// Containers with more entries than this are truncated.
pub const MAX_NORMALIZE_ITEM_COUNT: usize = 1000;

/// Key under which the truncation marker is stored in mappings.
pub const TRUNCATION_KEY: &str = "...";

/// A host value that could not be reduced to a [`NestedValue`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported value: {reason}")]
pub struct UnsupportedValue {
    pub reason: String,
}

impl UnsupportedValue {
    /// Text rendered in place of the value that failed to normalize.
    pub fn marker(&self) -> String {
        format!("[unsupported value: {}]", self.reason)
    }
}

/// Apply depth and item-count limits to an already canonical value.
pub fn normalize(value: &NestedValue) -> NestedValue {
    normalize_at(value, 0)
}

/// Reduce any serializable host value and normalize it.
///
/// **Returns**
/// - `Ok(value)` with limits applied.
/// - `Err(UnsupportedValue)` when serialization fails, e.g. a map with
///   non-string keys or a `Serialize` impl that reports an error.
pub fn normalize_serializable<T>(value: &T) -> Result<NestedValue, UnsupportedValue>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(value).map_err(|e| UnsupportedValue { reason: e.to_string() })?;
    Ok(normalize(&value))
}

fn normalize_at(value: &NestedValue, depth: usize) -> NestedValue {
    if depth > MAX_NORMALIZE_DEPTH {
        return Value::String(format!(
            "Over {} levels deep, aborting normalization",
            MAX_NORMALIZE_DEPTH
        ));
    }

    match value {
        Value::Array(items) => {
            let mut out: Vec<Value> = items
                .iter()
                .take(MAX_NORMALIZE_ITEM_COUNT)
                .map(|item| normalize_at(item, depth + 1))
                .collect();
            if items.len() > MAX_NORMALIZE_ITEM_COUNT {
                out.push(Value::String(truncation_marker(items.len())));
            }
            Value::Array(out)
        }
        Value::Object(map) => {
            let mut out: NestedMap = map
                .iter()
                .take(MAX_NORMALIZE_ITEM_COUNT)
                .map(|(key, item)| (key.clone(), normalize_at(item, depth + 1)))
                .collect();
            if map.len() > MAX_NORMALIZE_ITEM_COUNT {
                out.insert(TRUNCATION_KEY.to_string(), Value::String(truncation_marker(map.len())));
            }
            Value::Object(out)
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => value.clone(),
    }
}

fn truncation_marker(total: usize) -> String {
    format!(
        "Over {} items ({} total), aborting normalization",
        MAX_NORMALIZE_ITEM_COUNT, total
    )
}
