use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::warn;

use rocketchat_log_sink::init::{init_tracing_with_config, LayerConfig};
use rocketchat_log_sink::noop_sink::NoopSink;
use rocketchat_log_sink::Severity;

#[tokio::main]
async fn main() {
    let sink = Arc::new(NoopSink::default());

    let layer_config = LayerConfig {
        channel_buffer: 50_000,
        min_level: Severity::Warning,
        include_location: true,
        enable_stdout: false,
    };

    init_tracing_with_config(sink, layer_config).expect("install global subscriber");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        let span = tracing::info_span!("job", job_id = i % 16);
        let _entered = span.enter();
        warn!(iteration = i, "custom load test warning");
    }

    let elapsed = start.elapsed();
    println!("custom config: sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    sleep(Duration::from_secs(2)).await;
}
