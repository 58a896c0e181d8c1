use crate::normalize::NestedMap;
use crate::record::LogRecord;
use crate::severity::Severity;
use crate::sink::LogSink;
use chrono::Utc;
use serde_json::Value;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Event field that overrides the severity derived from the `tracing`
/// level, e.g. `error!(severity = "critical", "...")`.
pub const SEVERITY_FIELD: &str = "severity";

/// Targets whose events are never forwarded: this crate's own diagnostics
/// and the HTTP stack used for delivery.
const IGNORED_TARGETS: &[&str] = &[env!("CARGO_CRATE_NAME"), "reqwest", "hyper", "h2", "rustls"];

/// `tracing_subscriber` layer that observes events and forwards them to
/// an asynchronous [`LogSink`] via a bounded channel and background task.
///
/// Events at or above `min_level` become [`LogRecord`]s: event fields go
/// to `context`, fields of the enclosing spans go to `extra`. Network I/O
/// is fully decoupled from application threads; when the channel is full
/// records are dropped and counted.
pub struct WebhookLayer {
    sender: mpsc::Sender<LogRecord>,
    min_level: Severity,
    include_location: bool,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full.
    pub dropped_events: Arc<AtomicU64>,
    /// Rejected by the sink.
    pub failed_events: Arc<AtomicU64>,
}

impl WebhookLayer {
    /// Create a new layer and spawn a background task that pulls
    /// [`LogRecord`]s from a bounded channel and sends them to the
    /// provided [`LogSink`], one at a time.
    ///
    /// The task ends once the layer is dropped and the channel drained.
    /// Must be called from within a Tokio runtime.
    pub fn new(sink: Arc<dyn LogSink>, buffer: usize, min_level: Severity) -> (Self, JoinHandle<()>) {
        let buffer = buffer.max(16);
        let (tx, mut rx) = mpsc::channel::<LogRecord>(buffer);

        let total_events = Arc::new(AtomicU64::new(0));
        let enqueued_events = Arc::new(AtomicU64::new(0));
        let dropped_events = Arc::new(AtomicU64::new(0));
        let failed_events = Arc::new(AtomicU64::new(0));

        let failed_events_bg = Arc::clone(&failed_events);

        let handle = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                if let Err(e) = sink.send(&record).await {
                    failed_events_bg.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %e, level = %record.level_name, "failed to deliver log record");
                }
            }
            if let Err(e) = sink.flush().await {
                tracing::warn!(error = %e, "failed to flush log sink");
            }
        });

        (Self {
            sender: tx,
            min_level,
            include_location: false,
            total_events,
            enqueued_events,
            dropped_events,
            failed_events,
        }, handle)
    }

    /// Also record `module_path`, `file` and `line` of each event in `extra`.
    pub fn with_location(mut self, include_location: bool) -> Self {
        self.include_location = include_location;
        self
    }
}

fn is_ignored_target(target: &str) -> bool {
    IGNORED_TARGETS.iter().any(|ignored| {
        target
            .strip_prefix(ignored)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// Fields recorded on a span, inherited by events inside it.
struct SpanFields(NestedMap);

impl<S> Layer<S> for WebhookLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut visitor = FieldVisitor::for_span(NestedMap::new());
        attrs.record(&mut visitor);
        span.extensions_mut().insert(SpanFields(visitor.fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut extensions = span.extensions_mut();
        if let Some(SpanFields(fields)) = extensions.get_mut::<SpanFields>() {
            let mut visitor = FieldVisitor::for_span(std::mem::take(fields));
            values.record(&mut visitor);
            *fields = visitor.fields;
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        if is_ignored_target(meta.target()) {
            return;
        }

        let level_severity = Severity::from(*meta.level());
        if level_severity < self.min_level && meta.fields().field(SEVERITY_FIELD).is_none() {
            return;
        }

        let mut visitor = FieldVisitor::for_event();
        event.record(&mut visitor);

        let severity = visitor.severity.unwrap_or(level_severity);
        if severity < self.min_level {
            return;
        }

        let mut extra = NestedMap::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(SpanFields(fields)) = span.extensions().get::<SpanFields>() {
                    for (key, value) in fields {
                        extra.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        if self.include_location {
            if let Some(module_path) = meta.module_path() {
                extra.insert("module_path".to_string(), Value::from(module_path));
            }
            if let Some(file) = meta.file() {
                extra.insert("file".to_string(), Value::from(file));
            }
            if let Some(line) = meta.line() {
                extra.insert("line".to_string(), Value::from(line));
            }
        }

        let record = LogRecord {
            timestamp: Utc::now(),
            channel: meta.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            level_name: severity.name().to_string(),
            level: severity.code(),
            context: visitor.fields,
            extra,
        };

        match self.sender.try_send(record) {
            Ok(()) => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

use tracing::field::{Field, Visit};

/// Collects `tracing` fields into a [`NestedMap`].
///
/// For events, `message` and a parseable `severity` are pulled out of the
/// map; for spans every field is kept.
pub struct FieldVisitor {
    pub fields: NestedMap,
    pub message: Option<String>,
    pub severity: Option<Severity>,
    event: bool,
}

impl FieldVisitor {
    pub fn for_event() -> Self {
        FieldVisitor { fields: NestedMap::new(), message: None, severity: None, event: true }
    }

    pub fn for_span(fields: NestedMap) -> Self {
        FieldVisitor { fields, message: None, severity: None, event: false }
    }

    fn insert(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if self.event && name == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
            return;
        }
        if self.event && name == SEVERITY_FIELD {
            if let Some(severity) = value.as_str().and_then(|s| s.parse().ok()) {
                self.severity = Some(severity);
                return;
            }
        }
        self.fields.insert(name.to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, Value::String(format!("{:?}", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_own_and_http_targets() {
        assert!(is_ignored_target("rocketchat_log_sink"));
        assert!(is_ignored_target("rocketchat_log_sink::rocketchat"));
        assert!(is_ignored_target("hyper::proto::h1"));
        assert!(!is_ignored_target("hyperion"));
        assert!(!is_ignored_target("billing::charges"));
    }
}
