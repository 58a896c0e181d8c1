//! Environment variable names used by this crate for convenient
//! configuration of the webhook sink from services.
//!
//! These are purely helpers; the sink types remain decoupled from
//! environment access (see [`RocketChatConfig::from_lookup`]).
//!
//! [`RocketChatConfig::from_lookup`]: crate::config::RocketChatConfig::from_lookup

/// Comma-separated list of incoming webhook URLs. Required.
pub const LOG_SINK_ROCKETCHAT_WEBHOOKS_ENV: &str = "LOG_SINK_ROCKETCHAT_WEBHOOKS";

/// Optional display name for the posting user.
pub const LOG_SINK_ROCKETCHAT_USERNAME_ENV: &str = "LOG_SINK_ROCKETCHAT_USERNAME";

/// Optional emoji token used as the avatar, e.g. `:rotating_light:`.
pub const LOG_SINK_ROCKETCHAT_EMOJI_ENV: &str = "LOG_SINK_ROCKETCHAT_EMOJI";

/// Optional per-request timeout in milliseconds.
pub const LOG_SINK_ROCKETCHAT_TIMEOUT_MS_ENV: &str = "LOG_SINK_ROCKETCHAT_TIMEOUT_MS";

/// Minimum severity forwarded by the layer, e.g. `warning`.
pub const LOG_SINK_MIN_LEVEL_ENV: &str = "LOG_SINK_MIN_LEVEL";
