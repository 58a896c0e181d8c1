use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::fields::{fenced, record_fields, AttachmentField};
use crate::record::LogRecord;
use crate::severity::{color_for, UnknownSeverity};

/// Renders the human-readable text of a record.
///
/// When a formatter is configured on [`PayloadBuilder`] its output becomes
/// the attachment text and the payload gets no top-level text.
pub trait MessageFormatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

impl<F> MessageFormatter for F
where
    F: Fn(&LogRecord) -> String + Send + Sync,
{
    fn format(&self, record: &LogRecord) -> String {
        self(record)
    }
}

/// Colored block holding the record's level, optional text and fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub title: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub fields: Vec<AttachmentField>,
}

/// JSON body posted to an incoming webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub attachments: [Attachment; 1],
}

impl Payload {
    pub fn attachment(&self) -> &Attachment {
        &self.attachments[0]
    }
}

/// Builds webhook payloads from log records.
///
/// Stateless apart from its configuration, so one builder can be shared
/// across tasks.
#[derive(Clone, Default)]
pub struct PayloadBuilder {
    username: Option<String>,
    emoji: Option<String>,
    formatter: Option<Arc<dyn MessageFormatter>>,
}

impl fmt::Debug for PayloadBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadBuilder")
            .field("username", &self.username)
            .field("emoji", &self.emoji)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

impl PayloadBuilder {
    /// Empty strings are treated as "not configured".
    pub fn new(username: Option<String>, emoji: Option<String>) -> Self {
        PayloadBuilder {
            username: username.filter(|s| !s.is_empty()),
            emoji: emoji.filter(|s| !s.is_empty()),
            formatter: None,
        }
    }

    pub fn with_formatter(mut self, formatter: impl MessageFormatter + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn with_shared_formatter(mut self, formatter: Arc<dyn MessageFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Build the payload for a single record.
    ///
    /// **Returns**
    /// - `Err(UnknownSeverity)` if `record.level` is not one of the known
    ///   level codes; no payload is produced in that case.
    pub fn build(&self, record: &LogRecord) -> Result<Payload, UnknownSeverity> {
        let color = color_for(record.level)?;

        let attachment = Attachment {
            title: record.level_name.clone(),
            color: color.to_string(),
            text: None,
            fields: record_fields(&record.extra, &record.context),
        };

        let payload = Payload {
            username: self.username.clone(),
            emoji: self.emoji.clone(),
            text: None,
            attachments: [attachment],
        };

        Ok(match &self.formatter {
            Some(formatter) => with_formatted_attachment_text(payload, formatter.as_ref(), record),
            None => with_fenced_message_text(payload, record),
        })
    }
}

/// Formatter configured: it owns the full message rendering, which lands
/// in the attachment.
fn with_formatted_attachment_text(
    mut payload: Payload,
    formatter: &dyn MessageFormatter,
    record: &LogRecord,
) -> Payload {
    payload.attachments[0].text = Some(formatter.format(record));
    payload
}

/// No formatter: the raw message goes into the top-level text, fenced.
fn with_fenced_message_text(mut payload: Payload, record: &LogRecord) -> Payload {
    payload.text = Some(fenced(&record.message));
    payload
}
