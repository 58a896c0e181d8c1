use crate::config::{ConfigError, RocketChatConfig};
use crate::payload::{MessageFormatter, Payload, PayloadBuilder};
use crate::record::LogRecord;
use crate::sink::{LogSink, SinkError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

/// Why a single webhook did not accept a payload.
#[derive(thiserror::Error, Debug)]
pub enum EndpointError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook responded with status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Failed delivery to one configured webhook.
#[derive(thiserror::Error, Debug)]
#[error("#{index} {endpoint}: {error}")]
pub struct EndpointFailure {
    /// Position of the webhook in the configured list.
    pub index: usize,
    /// Webhook URL with its token path hidden.
    pub endpoint: String,
    pub error: EndpointError,
}

/// Aggregate of every webhook that failed while delivering one payload.
///
/// Webhooks that are not listed here accepted the payload.
#[derive(thiserror::Error, Debug)]
#[error("delivery failed for {} of {attempted} webhook(s): {}", failure_count(.failures), join_failures(.failures))]
pub struct DeliveryError {
    pub attempted: usize,
    pub failures: Vec<EndpointFailure>,
}

fn failure_count(failures: &[EndpointFailure]) -> usize {
    failures.len()
}

fn join_failures(failures: &[EndpointFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Hide everything after the origin of a webhook URL; incoming webhook
/// URLs carry their token in the path.
pub fn redact_webhook(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => format!("{}/***", parsed.origin().ascii_serialization()),
        Err(_) => "<invalid url>".to_string(),
    }
}

/// [`LogSink`] that posts Rocket.Chat incoming-webhook messages.
///
/// Each record becomes one [`Payload`], posted once to every configured
/// webhook in order. A failing webhook does not stop delivery to the
/// others; all failures are reported together as a [`DeliveryError`].
#[derive(Clone, Debug)]
pub struct RocketChatSink {
    client: Client,
    webhooks: Vec<String>,
    builder: PayloadBuilder,
}

impl RocketChatSink {
    /// Construct a sink from a validated configuration.
    ///
    /// **Returns**
    /// - `Err(ConfigError)` if the webhook list is empty, a URL is invalid
    ///   or the HTTP client cannot be created.
    pub fn new(config: RocketChatConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(RocketChatSink {
            client,
            builder: PayloadBuilder::new(config.username, config.emoji),
            webhooks: config.webhooks,
        })
    }

    /// Render messages with `formatter` into the attachment text instead
    /// of the fenced raw message.
    pub fn with_formatter(mut self, formatter: impl MessageFormatter + 'static) -> Self {
        self.builder = self.builder.with_formatter(formatter);
        self
    }

    pub fn builder(&self) -> &PayloadBuilder {
        &self.builder
    }

    pub fn webhooks(&self) -> &[String] {
        &self.webhooks
    }

    /// POST `payload` to every configured webhook.
    pub async fn deliver(&self, payload: &Payload) -> Result<(), DeliveryError> {
        let mut failures = Vec::new();

        for (index, webhook) in self.webhooks.iter().enumerate() {
            match self.post(webhook, payload).await {
                Ok(()) => {
                    tracing::debug!(index, endpoint = %redact_webhook(webhook), "webhook accepted payload");
                }
                Err(error) => {
                    let endpoint = redact_webhook(webhook);
                    tracing::warn!(index, endpoint = %endpoint, error = %error, "webhook delivery failed");
                    failures.push(EndpointFailure { index, endpoint, error });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DeliveryError {
                attempted: self.webhooks.len(),
                failures,
            })
        }
    }

    async fn post(&self, webhook: &str, payload: &Payload) -> Result<(), EndpointError> {
        let resp = self.client.post(webhook).json(payload).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(EndpointError::Status { status, body })
        }
    }
}

#[async_trait]
impl LogSink for RocketChatSink {
    async fn send(&self, record: &LogRecord) -> Result<(), SinkError> {
        let payload = self.builder.build(record)?;
        self.deliver(&payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_keeps_only_the_origin() {
        assert_eq!(
            redact_webhook("https://chat.example.com/hooks/abc123/s3cr3t"),
            "https://chat.example.com/***"
        );
        assert_eq!(redact_webhook("http://127.0.0.1:8080/hooks/x"), "http://127.0.0.1:8080/***");
        assert_eq!(redact_webhook("not a url"), "<invalid url>");
    }

    #[test]
    fn delivery_error_lists_every_failure() {
        let err = DeliveryError {
            attempted: 3,
            failures: vec![
                EndpointFailure {
                    index: 0,
                    endpoint: redact_webhook("https://a.example/hooks/1/t"),
                    error: EndpointError::Status { status: StatusCode::BAD_GATEWAY, body: "down".into() },
                },
                EndpointFailure {
                    index: 2,
                    endpoint: redact_webhook("https://c.example/hooks/3/t"),
                    error: EndpointError::Status { status: StatusCode::NOT_FOUND, body: String::new() },
                },
            ],
        };

        assert_eq!(
            err.to_string(),
            "delivery failed for 2 of 3 webhook(s): \
             #0 https://a.example/***: webhook responded with status 502 Bad Gateway: down; \
             #2 https://c.example/***: webhook responded with status 404 Not Found: "
        );
    }
}
