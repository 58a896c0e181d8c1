use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use rocketchat_log_sink::{
    init::init_tracing,
    payload::PayloadBuilder,
    record::LogRecord,
    sink::{LogSink, SinkError},
};

/// Example of reusing the payload builder with a completely custom
/// transport by implementing the `LogSink` trait directly. Imagine this
/// pushes messages onto an internal queue instead of calling a webhook.
struct StdoutPayloadSink {
    builder: PayloadBuilder,
}

#[async_trait]
impl LogSink for StdoutPayloadSink {
    async fn send(&self, record: &LogRecord) -> Result<(), SinkError> {
        let payload = self.builder.build(record)?;
        let body = serde_json::to_string_pretty(&payload).map_err(SinkError::other)?;
        println!("[payload] {}", body);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let sink: Arc<dyn LogSink> = Arc::new(StdoutPayloadSink {
        builder: PayloadBuilder::new(Some("logbot".to_string()), Some(":robot:".to_string())),
    });

    init_tracing(sink).expect("install global subscriber");

    info!("custom sink example started");
    error!(db = "primary", retries = 3, "simulated error rendered as a webhook payload");

    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
}
