// Webhook delivery against local mock servers.

use rocketchat_log_sink::config::RocketChatConfig;
use rocketchat_log_sink::formatter::LineFormatter;
use rocketchat_log_sink::rocketchat::{EndpointError, RocketChatSink};
use rocketchat_log_sink::sink::{LogSink, SinkError};
use rocketchat_log_sink::{LogRecord, Severity};
use serde_json::json;
use std::net::TcpListener;
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOOK_PATH: &str = "/hooks/integration/token";

async fn webhook_server(status: u16, expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

fn hook_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), HOOK_PATH)
}

/// URL of a local port nothing is listening on.
fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}{HOOK_PATH}")
}

fn record() -> LogRecord {
    LogRecord::new(Severity::Error, "billing", "charge failed")
        .with_context("user", "alice")
        .with_context("tags", &["a", "b"])
        .with_extra("host", "web-1")
}

#[tokio::test]
async fn posts_the_payload_to_every_webhook() {
    let expected = json!({
        "username": "alerts",
        "emoji": ":fire:",
        "text": "```charge failed```",
        "attachments": [{
            "title": "ERROR",
            "color": "#F44336",
            "fields": [
                {"title": "Host", "value": "web-1", "short": false},
                {"title": "User", "value": "alice", "short": false},
                {"title": "Tags", "value": "```[\"a\",\"b\"]```", "short": false}
            ]
        }]
    });

    let mut servers = Vec::new();
    for _ in 0..2 {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(HOOK_PATH))
            .and(body_json(expected.clone()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        servers.push(server);
    }

    let config = RocketChatConfig::new(servers.iter().map(hook_url))
        .with_username("alerts")
        .with_emoji(":fire:");
    let sink = RocketChatSink::new(config).unwrap();

    sink.send(&record()).await.unwrap();
}

#[tokio::test]
async fn failing_webhook_does_not_stop_the_others() {
    let first = webhook_server(200, 1).await;
    let second = webhook_server(500, 1).await;
    let third = webhook_server(200, 1).await;

    let sink = RocketChatSink::new(RocketChatConfig::new([
        hook_url(&first),
        hook_url(&second),
        hook_url(&third),
    ]))
    .unwrap();

    let err = sink.send(&record()).await.unwrap_err();
    let delivery = match err {
        SinkError::Delivery(delivery) => delivery,
        other => panic!("expected a delivery error, got {other:?}"),
    };

    assert_eq!(delivery.attempted, 3);
    assert_eq!(delivery.failures.len(), 1);
    let failure = &delivery.failures[0];
    assert_eq!(failure.index, 1);
    assert_eq!(failure.endpoint, format!("{}/***", second.uri()));
    match &failure.error {
        EndpointError::Status { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "nope");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
    assert!(!delivery.to_string().contains("token"));
}

#[tokio::test]
async fn transport_errors_are_reported_per_endpoint() {
    let first = webhook_server(200, 1).await;
    let third = webhook_server(200, 1).await;

    let config = RocketChatConfig::new([hook_url(&first), unreachable_url(), hook_url(&third)])
        .with_timeout(Duration::from_secs(2));
    let sink = RocketChatSink::new(config).unwrap();
    let payload = sink.builder().build(&record()).unwrap();

    let delivery = sink.deliver(&payload).await.unwrap_err();
    assert_eq!(delivery.failures.len(), 1);
    assert_eq!(delivery.failures[0].index, 1);
    assert!(matches!(delivery.failures[0].error, EndpointError::Transport(_)));
}

#[tokio::test]
async fn unknown_severity_sends_nothing() {
    let server = webhook_server(200, 0).await;
    let sink = RocketChatSink::new(RocketChatConfig::new([hook_url(&server)])).unwrap();

    let mut record = record();
    record.level = 42;

    let err = sink.send(&record).await.unwrap_err();
    assert!(matches!(err, SinkError::Severity(_)), "{err:?}");
}

#[tokio::test]
async fn formatter_text_goes_into_the_attachment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .and(body_partial_json(json!({
            "attachments": [{"text": "billing.ERROR: charge failed"}]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = RocketChatSink::new(RocketChatConfig::new([hook_url(&server)]))
        .unwrap()
        .with_formatter(LineFormatter::new("%channel%.%level_name%: %message%"));

    sink.send(&record()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("text").is_none());
}
