use crate::config::{min_level_from_lookup, ConfigError, RocketChatConfig};
use crate::layer::WebhookLayer;
use crate::rocketchat::RocketChatSink;
use crate::severity::Severity;
use crate::sink::LogSink;
use std::sync::Arc;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Layer configuration.
///
/// **Fields**
/// - `channel_buffer`: maximum number of [`LogRecord`]s queued before new
///   records are dropped.
/// - `min_level`: lowest severity forwarded to the sink.
/// - `include_location`: add `module_path`/`file`/`line` to `extra`.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to the [`WebhookLayer`] so events are also printed.
///
/// [`LogRecord`]: crate::record::LogRecord
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub channel_buffer: usize,
    pub min_level: Severity,
    pub include_location: bool,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            min_level: Severity::Error,
            include_location: false,
            enable_stdout: true,
        }
    }
}

/// Error returned by [`init_from_env`].
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Build a [`WebhookLayer`] for `sink` according to `config`.
///
/// Useful when composing a subscriber by hand instead of using
/// [`init_tracing_with_config`]. Must be called inside a Tokio runtime.
pub fn build_layer(sink: Arc<dyn LogSink>, config: &LayerConfig) -> WebhookLayer {
    let (layer, _handle) = WebhookLayer::new(sink, config.channel_buffer, config.min_level);
    layer.with_location(config.include_location)
}

/// Install a global `tracing` subscriber forwarding events to `sink`.
///
/// **Effects**
///
/// Installs a [`Registry`] combined with [`WebhookLayer`] (and a `fmt`
/// layer when `enable_stdout` is set) as the global default subscriber.
///
/// **Returns**
/// - `Err(SetGlobalDefaultError)` if a global subscriber was already set.
pub fn init_tracing_with_config(
    sink: Arc<dyn LogSink>,
    config: LayerConfig,
) -> Result<(), SetGlobalDefaultError> {
    let layer = build_layer(sink, &config);

    // The two subscriber shapes have different types, hence two branches.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Initialize tracing with [`LayerConfig::default`]: errors and above are
/// forwarded and events are also printed to stdout.
pub fn init_tracing(sink: Arc<dyn LogSink>) -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(sink, LayerConfig::default())
}

/// Build a [`RocketChatSink`] and the minimum level from the `LOG_SINK_*`
/// environment variables (see [`crate::env`]) and install it globally.
pub fn init_from_env() -> Result<(), InitError> {
    let lookup = |key: &str| std::env::var(key).ok();

    let sink = RocketChatSink::new(RocketChatConfig::from_lookup(lookup)?)?;
    let config = LayerConfig {
        min_level: min_level_from_lookup(lookup)?,
        ..LayerConfig::default()
    };

    init_tracing_with_config(Arc::new(sink), config)?;
    Ok(())
}
