//! Common test utilities for hook-relay integration tests
//!
//! This module provides:
//! - A recording [`TriggerApi`] double with configurable failures
//! - A scripted [`WebhookProvider`] double
//! - Router and request helpers

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use hook_relay_api::{create_router, AppState, ProviderId, ProviderRegistry};
use hook_relay_core::{
    trigger::{TriggerApi, TriggerError, TriggerParams, TriggerUrlResolver},
    webhook::{GithubProvider, TransformResult, WebhookProvider, WebhookRequest},
};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};
use tower::ServiceExt;
use url::Url;

pub const BASE_URL: &str = "https://builds.example.com";

// ============================================================================
// Recording Trigger API
// ============================================================================

/// One call received by [`RecordingTriggerApi`]
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedCall {
    pub url: String,
    pub api_token: String,
    pub params: TriggerParams,
}

/// Trigger API double that records every call
///
/// Calls whose zero-based position is in `fail_on` return an error.
#[derive(Clone, Default)]
pub struct RecordingTriggerApi {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    fail_on: Arc<HashSet<usize>>,
}

impl RecordingTriggerApi {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn failing_on(indices: &[usize]) -> Self {
        Self {
            calls: Arc::default(),
            fail_on: Arc::new(indices.iter().copied().collect()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TriggerApi for RecordingTriggerApi {
    async fn trigger(
        &self,
        url: &Url,
        api_token: &str,
        params: &TriggerParams,
    ) -> Result<(), TriggerError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                url: url.to_string(),
                api_token: api_token.to_string(),
                params: params.clone(),
            });
            calls.len() - 1
        };

        if self.fail_on.contains(&index) {
            return Err(TriggerError::Rejected {
                status: 500,
                message: format!("trigger {index} failed"),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Scripted Provider
// ============================================================================

/// Provider double that always returns the same result
#[allow(dead_code)]
pub struct ScriptedProvider {
    result: TransformResult,
    seen: Mutex<usize>,
}

#[allow(dead_code)]
impl ScriptedProvider {
    pub fn new(result: TransformResult) -> Arc<Self> {
        Arc::new(Self {
            result,
            seen: Mutex::new(0),
        })
    }

    pub fn transform_count(&self) -> usize {
        *self.seen.lock().unwrap()
    }
}

impl WebhookProvider for ScriptedProvider {
    fn transform(&self, _request: &WebhookRequest) -> TransformResult {
        *self.seen.lock().unwrap() += 1;
        self.result.clone()
    }
}

// ============================================================================
// Router helpers
// ============================================================================

/// Router with the GitHub provider and an optional scripted provider
pub fn test_app(
    scripted: Option<Arc<ScriptedProvider>>,
    trigger_api: RecordingTriggerApi,
) -> Router {
    let mut registry = ProviderRegistry::new();
    registry.register(
        ProviderId::new(GithubProvider::PROVIDER_ID).unwrap(),
        Arc::new(GithubProvider::new()),
    );
    if let Some(provider) = scripted {
        registry.register(ProviderId::new("scripted").unwrap(), provider);
    }

    let resolver = TriggerUrlResolver::new(Url::parse(BASE_URL).unwrap(), None);
    let state = AppState::new(registry, resolver, Arc::new(trigger_api));
    create_router(state, 1024 * 1024)
}

/// Build a POST request with optional GitHub event header
pub fn hook_request(uri: &str, github_event: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(event) = github_event {
        builder = builder.header("x-github-event", event);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Send a request and decode the JSON response body
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response: Response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}
