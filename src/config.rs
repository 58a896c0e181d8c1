use reqwest::Url;
use std::time::Duration;

use crate::env::{
    LOG_SINK_MIN_LEVEL_ENV, LOG_SINK_ROCKETCHAT_EMOJI_ENV, LOG_SINK_ROCKETCHAT_TIMEOUT_MS_ENV,
    LOG_SINK_ROCKETCHAT_USERNAME_ENV, LOG_SINK_ROCKETCHAT_WEBHOOKS_ENV,
};
use crate::severity::{ParseSeverityError, Severity};

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for [`RocketChatSink`](crate::rocketchat::RocketChatSink).
///
/// **Fields**
/// - `webhooks`: incoming webhook URLs; each payload is posted to all of
///   them. The token is part of the URL path.
/// - `username`: display name override, ignored when empty.
/// - `emoji`: avatar emoji override, ignored when empty.
/// - `timeout`: per-request timeout applied by the HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RocketChatConfig {
    pub webhooks: Vec<String>,
    pub username: Option<String>,
    pub emoji: Option<String>,
    pub timeout: Duration,
}

/// Error type returned when building or loading configuration.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one webhook URL is required")]
    NoWebhooks,

    #[error("invalid webhook URL {url:?}: {reason}")]
    InvalidWebhook { url: String, reason: String },

    #[error("invalid timeout {0:?}: expected milliseconds")]
    InvalidTimeout(String),

    #[error(transparent)]
    InvalidLevel(#[from] ParseSeverityError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl RocketChatConfig {
    pub fn new<I, S>(webhooks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RocketChatConfig {
            webhooks: webhooks.into_iter().map(Into::into).collect(),
            username: None,
            emoji: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that at least one webhook is configured and that every
    /// webhook is an absolute `http`/`https` URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webhooks.is_empty() {
            return Err(ConfigError::NoWebhooks);
        }

        for url in &self.webhooks {
            let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidWebhook {
                url: url.clone(),
                reason: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidWebhook {
                    url: url.clone(),
                    reason: format!("unsupported scheme {:?}", parsed.scheme()),
                });
            }
        }
        Ok(())
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup, using the
    /// variable names from [`crate::env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let webhooks = lookup(LOG_SINK_ROCKETCHAT_WEBHOOKS_ENV)
            .map(|raw| parse_webhooks(&raw))
            .unwrap_or_default();

        let timeout = match lookup(LOG_SINK_ROCKETCHAT_TIMEOUT_MS_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidTimeout(raw))?,
            None => DEFAULT_TIMEOUT,
        };

        let config = RocketChatConfig {
            webhooks,
            username: lookup(LOG_SINK_ROCKETCHAT_USERNAME_ENV),
            emoji: lookup(LOG_SINK_ROCKETCHAT_EMOJI_ENV),
            timeout,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Split a comma-separated webhook list, dropping empty entries.
pub fn parse_webhooks(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Minimum severity from a lookup, defaulting to [`Severity::Error`].
pub fn min_level_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Severity, ConfigError> {
    match lookup(LOG_SINK_MIN_LEVEL_ENV) {
        Some(raw) => Ok(raw.parse()?),
        None => Ok(Severity::Error),
    }
}
