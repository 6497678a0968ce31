//! Tests for [`HttpTriggerApi`] against a mock trigger API.

use super::*;
use std::time::Duration;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn api() -> HttpTriggerApi {
    HttpTriggerApi::new(Duration::from_secs(5), "hook-relay-tests").unwrap()
}

fn trigger_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/app/slug/build/start.json", server.uri())).unwrap()
}

/// Verify that the request body carries hook info and build params.
#[tokio::test]
async fn test_trigger_posts_expected_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/app/slug/build/start.json"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "hook_info": { "type": "bitrise", "api_token": "api-token" },
            "build_params": { "branch": "master", "commit_hash": "abc" },
            "triggered_by": "webhook-github/push"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "status": "ok",
            "message": "triggered build",
            "build_number": 42,
            "build_url": "https://www.bitrise.io/build/abc"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut params = TriggerParams::for_branch("master").triggered_by("webhook-github/push");
    params.build_params.commit_hash = Some("abc".to_string());

    let result = api()
        .trigger(&trigger_url(&mock_server), "api-token", &params)
        .await;

    assert!(result.is_ok(), "unexpected error: {result:?}");
}

/// Verify that a non-2xx response surfaces the API's message.
#[tokio::test]
async fn test_rejected_response_uses_message_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "status": "error",
            "message": "Invalid API token"
        })))
        .mount(&mock_server)
        .await;

    let result = api()
        .trigger(
            &trigger_url(&mock_server),
            "bad-token",
            &TriggerParams::for_branch("master"),
        )
        .await;

    match result {
        Err(TriggerError::Rejected { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "Invalid API token");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

/// Verify that a non-JSON error body is reported verbatim.
#[tokio::test]
async fn test_rejected_response_with_plain_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded\n"))
        .mount(&mock_server)
        .await;

    let result = api()
        .trigger(
            &trigger_url(&mock_server),
            "token",
            &TriggerParams::for_branch("master"),
        )
        .await;

    match result {
        Err(TriggerError::Rejected { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

/// Verify that a successful response without a JSON body is still a success.
#[tokio::test]
async fn test_success_without_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let result = api()
        .trigger(
            &trigger_url(&mock_server),
            "token",
            &TriggerParams::for_tag("v1"),
        )
        .await;

    assert!(result.is_ok());
}

/// Verify that invalid params are rejected before any request is sent.
#[tokio::test]
async fn test_invalid_params_are_not_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = api()
        .trigger(&trigger_url(&mock_server), "token", &TriggerParams::default())
        .await;

    assert!(matches!(result, Err(TriggerError::InvalidParams { .. })));
}

/// Verify that a slow API hits the client timeout.
#[tokio::test]
async fn test_timeout_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let api = HttpTriggerApi::new(Duration::from_millis(100), "hook-relay-tests").unwrap();
    let result = api
        .trigger(
            &trigger_url(&mock_server),
            "token",
            &TriggerParams::for_branch("main"),
        )
        .await;

    assert!(matches!(result, Err(TriggerError::Transport(_))));
}
