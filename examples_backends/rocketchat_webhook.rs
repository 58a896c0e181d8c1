use std::sync::Arc;

use tokio::time::{sleep, Duration};
use tracing::{error, info};
use rocketchat_log_sink::{
    config::RocketChatConfig,
    formatter::LineFormatter,
    init::init_tracing,
    rocketchat::RocketChatSink,
    sink::LogSink,
};

#[tokio::main]
async fn main() {
    // Example: LOG_SINK_ROCKETCHAT_WEBHOOKS=https://chat.example.com/hooks/<id>/<token>
    let config = RocketChatConfig::from_env().expect("invalid LOG_SINK_ROCKETCHAT_* settings");
    let sink: Arc<dyn LogSink> = Arc::new(
        RocketChatSink::new(config)
            .expect("failed to build rocket.chat sink")
            .with_formatter(LineFormatter::default()),
    );

    init_tracing(sink).expect("install global subscriber");

    let span = tracing::info_span!("checkout", cart_id = "c-981");
    let _entered = span.enter();

    info!("rocket.chat example started");
    error!(order_id = 123, gateway = "stripe", "payment declined");

    // Give the background task time to post the message.
    sleep(Duration::from_secs(2)).await;
}
