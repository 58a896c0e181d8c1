use chrono::SecondsFormat;
use serde_json::Value;

use crate::normalize::{normalize, NestedMap};
use crate::payload::MessageFormatter;
use crate::record::LogRecord;

/// Default line template.
pub const SIMPLE_FORMAT: &str = "[%datetime%] %channel%.%level_name%: %message% %context% %extra%";

/// Single-line text formatter driven by a `%placeholder%` template.
///
/// Supported placeholders: `%datetime%` (RFC 3339, seconds precision),
/// `%channel%`, `%level_name%`, `%level%`, `%message%`, `%context%` and
/// `%extra%` (compact JSON).
#[derive(Debug, Clone)]
pub struct LineFormatter {
    template: String,
    ignore_empty_context_and_extra: bool,
}

impl Default for LineFormatter {
    fn default() -> Self {
        LineFormatter::new(SIMPLE_FORMAT)
    }
}

impl LineFormatter {
    pub fn new(template: impl Into<String>) -> Self {
        LineFormatter {
            template: template.into(),
            ignore_empty_context_and_extra: false,
        }
    }

    /// Render empty context/extra maps as nothing instead of `{}`.
    pub fn ignore_empty_context_and_extra(mut self, ignore: bool) -> Self {
        self.ignore_empty_context_and_extra = ignore;
        self
    }

    fn render_map(&self, map: &NestedMap) -> String {
        if map.is_empty() && self.ignore_empty_context_and_extra {
            return String::new();
        }
        normalize(&Value::Object(map.clone())).to_string()
    }
}

impl LineFormatter {
    fn placeholder(&self, name: &str, record: &LogRecord) -> Option<String> {
        let value = match name {
            "datetime" => record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, false),
            "channel" => record.channel.clone(),
            "level_name" => record.level_name.clone(),
            "level" => record.level.to_string(),
            "message" => record.message.clone(),
            "context" => self.render_map(&record.context),
            "extra" => self.render_map(&record.extra),
            _ => return None,
        };
        Some(value)
    }
}

impl MessageFormatter for LineFormatter {
    /// Substituted values are never rescanned, so `%...%` text inside a
    /// message, channel or context value is emitted as-is.
    fn format(&self, record: &LogRecord) -> String {
        let mut line = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find('%') {
            line.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let substituted = after
                .find('%')
                .and_then(|end| Some((end, self.placeholder(&after[..end], record)?)));
            match substituted {
                Some((end, value)) => {
                    line.push_str(&value);
                    rest = &after[end + 1..];
                }
                None => {
                    line.push('%');
                    rest = after;
                }
            }
        }
        line.push_str(rest);

        if self.ignore_empty_context_and_extra {
            line.trim_end().to_string()
        } else {
            line
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Severity;
    use chrono::{TimeZone, Utc};

    fn record() -> LogRecord {
        let mut record = LogRecord::new(Severity::Critical, "payments", "gateway down")
            .with_context("attempt", &3);
        record.timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        record
    }

    #[test]
    fn default_template() {
        let line = LineFormatter::default().format(&record());
        assert_eq!(line, r#"[2024-05-01T12:30:00+00:00] payments.CRITICAL: gateway down {"attempt":3} {}"#);
    }

    #[test]
    fn empty_maps_can_be_hidden() {
        let line = LineFormatter::default()
            .ignore_empty_context_and_extra(true)
            .format(&record());
        assert_eq!(line, r#"[2024-05-01T12:30:00+00:00] payments.CRITICAL: gateway down {"attempt":3}"#);
    }

    #[test]
    fn custom_template_and_placeholder_like_messages() {
        let mut record = record();
        record.message = "100%channel% sure".into();
        let line = LineFormatter::new("%level% %message%").format(&record);
        assert_eq!(line, "500 100%channel% sure");
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        let mut record = record().with_context("note", "%message%");
        record.channel = "jobs%context%".into();
        record.message = "SECRET-MSG".into();

        let line = LineFormatter::new("%channel% %context% | %message%").format(&record);
        assert_eq!(line, r#"jobs%context% {"attempt":3,"note":"%message%"} | SECRET-MSG"#);
    }

    #[test]
    fn unknown_tokens_and_stray_percent_signs_are_kept() {
        let line = LineFormatter::new("50% of %nope% %level_name%").format(&record());
        assert_eq!(line, "50% of %nope% CRITICAL");
    }
}
