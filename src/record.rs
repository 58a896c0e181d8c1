use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::{normalize_serializable, NestedMap, NestedValue};
use crate::severity::Severity;

/// A single log entry as seen by the payload builder.
///
/// `level` is kept as a raw code rather than a [`Severity`] so records
/// coming from foreign producers can carry codes this crate does not know;
/// those are rejected when the payload is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    /// Logger name; the `tracing` target for records produced by the layer.
    pub channel: String,
    pub message: String,
    pub level_name: String,
    pub level: u16,
    /// Data passed with the logging call itself.
    #[serde(default)]
    pub context: NestedMap,
    /// Ambient data attached around the call (span fields, location).
    #[serde(default)]
    pub extra: NestedMap,
}

impl LogRecord {
    /// Create a record stamped with the current time and empty
    /// context/extra maps.
    pub fn new(severity: Severity, channel: impl Into<String>, message: impl Into<String>) -> Self {
        LogRecord {
            timestamp: Utc::now(),
            channel: channel.into(),
            message: message.into(),
            level_name: severity.name().to_string(),
            level: severity.code(),
            context: NestedMap::new(),
            extra: NestedMap::new(),
        }
    }

    /// Add a context entry from any serializable value.
    ///
    /// Values that cannot be reduced to a [`NestedValue`] are stored as an
    /// error marker string so the remaining entries still render.
    pub fn with_context<T>(mut self, key: impl Into<String>, value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        let key = key.into();
        let value = to_nested_or_marker(&key, value);
        self.context.insert(key, value);
        self
    }

    /// Add an extra entry from any serializable value.
    pub fn with_extra<T>(mut self, key: impl Into<String>, value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        let key = key.into();
        let value = to_nested_or_marker(&key, value);
        self.extra.insert(key, value);
        self
    }

    /// The record's severity, if its level code is a known one.
    pub fn severity(&self) -> Option<Severity> {
        Severity::from_code(self.level).ok()
    }
}

fn to_nested_or_marker<T>(key: &str, value: &T) -> NestedValue
where
    T: Serialize + ?Sized,
{
    match normalize_serializable(value) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, error = %err, "dropping log value that cannot be normalized");
            NestedValue::String(err.marker())
        }
    }
}
