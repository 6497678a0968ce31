//! # Hook Relay HTTP Service
//!
//! HTTP server that receives webhooks from external services, turns them into
//! build trigger requests, and forwards those to the build trigger API.
//!
//! Routes:
//! - `POST /h/{service_id}/{app_slug}/{api_token}`
//! - `POST /h/{service_id}?app_slug=..&api_token=..`
//! - `POST /h?service_id=..&app_slug=..&api_token=..`
//! - `GET /health`
//!
//! Path values take precedence over query values. Accepted requests answer
//! `200 {"message": ..}`; rejected ones answer `400 {"errors": [..]}`.

pub mod config;
pub mod errors;
pub mod outcome;
pub mod pipeline;
pub mod provider_registry;
pub mod responses;

pub use config::{EnvironmentMode, LoggingConfig, ServerConfig, ServiceConfig, TriggerConfig};
pub use errors::{ConfigError, HookError, ServiceError};
pub use outcome::HookOutcome;
pub use pipeline::{process_hook, HookParams};
pub use provider_registry::{InvalidProviderIdError, ProviderId, ProviderRegistry};
pub use responses::{ErrorResponse, HealthResponse, SuccessResponse};

use axum::{
    extract::{rejection::QueryRejection, DefaultBodyLimit, Path, Query, State},
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use hook_relay_core::{
    dispatch::TriggerDispatcher,
    trigger::{TriggerApi, TriggerUrlResolver},
    webhook::WebhookRequest,
};
use std::{
    collections::HashMap,
    future::{Future, IntoFuture},
    sync::Arc,
    time::Duration,
};
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
///
/// Everything here is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Service identifier to provider lookup
    pub registry: Arc<ProviderRegistry>,

    /// Trigger endpoint resolution
    pub resolver: Arc<TriggerUrlResolver>,

    /// Fan-out to the trigger API
    pub dispatcher: TriggerDispatcher,
}

impl AppState {
    pub fn new(
        registry: ProviderRegistry,
        resolver: TriggerUrlResolver,
        trigger_api: Arc<dyn TriggerApi>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            resolver: Arc::new(resolver),
            dispatcher: TriggerDispatcher::new(trigger_api),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the HTTP router
///
/// `max_body_size` replaces axum's default body limit for all routes.
pub fn create_router(state: AppState, max_body_size: usize) -> Router {
    let hook_routes = Router::new()
        .route("/h", post(handle_hook_query))
        .route("/h/{service_id}", post(handle_hook_service))
        .route("/h/{service_id}/{app_slug}/{api_token}", post(handle_hook_path));

    let health_routes = Router::new().route("/health", get(handle_health_check));

    Router::new()
        .merge(hook_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_body_size))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
///
/// Serves until SIGINT or SIGTERM, then lets in-flight requests finish for at
/// most `server.shutdown_timeout_seconds`.
pub async fn start_server(
    config: ServiceConfig,
    registry: ProviderRegistry,
    trigger_api: Arc<dyn TriggerApi>,
) -> Result<(), ServiceError> {
    let resolver = config.trigger.resolver()?;
    let state = AppState::new(registry, resolver, trigger_api);
    let app = create_router(state, config.server.max_body_size);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    info!(address = %address, "Starting HTTP server");

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal(shutdown_timeout).await;
            let _ = shutdown_tx.send(());
        })
        .into_future();

    match with_shutdown_deadline(server, shutdown_rx, shutdown_timeout).await {
        Some(result) => result.map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?,
        None => warn!(
            timeout_seconds = shutdown_timeout.as_secs(),
            "Graceful shutdown timed out; abandoning in-flight requests"
        ),
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Drive `server` to completion, giving up `timeout` after shutdown starts
///
/// Returns `None` when the deadline passed before the server finished.
async fn with_shutdown_deadline<F>(
    server: F,
    shutdown_started: oneshot::Receiver<()>,
    timeout: Duration,
) -> Option<F::Output>
where
    F: Future,
{
    let deadline = async move {
        match shutdown_started.await {
            Ok(()) => tokio::time::sleep(timeout).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        output = server => Some(output),
        _ = deadline => None,
    }
}

async fn shutdown_signal(shutdown_timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!(timeout_seconds = shutdown_timeout.as_secs(), "Received SIGINT, shutting down");
        },
        _ = terminate => {
            info!(timeout_seconds = shutdown_timeout.as_secs(), "Received SIGTERM, shutting down");
        },
    }
}

// ============================================================================
// Hook Handlers
// ============================================================================

async fn handle_hook_path(
    State(state): State<AppState>,
    Path((service_id, app_slug, api_token)): Path<(String, String, String)>,
    query: Result<Query<HookParams>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<HookOutcome, HookError> {
    // Path values are complete here; an unparseable query is ignored.
    let query = query.map(|Query(q)| q).unwrap_or_else(|rejection| {
        debug!(error = %rejection.body_text(), "Ignoring unparseable query string");
        HookParams::default()
    });

    let params = HookParams {
        service_id: Some(service_id),
        app_slug: Some(app_slug),
        api_token: Some(api_token),
    }
    .or(query);

    handle_hook(&state, params, headers, body).await
}

async fn handle_hook_service(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
    query: Result<Query<HookParams>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<HookOutcome, HookError> {
    let params = HookParams {
        service_id: Some(service_id),
        ..HookParams::default()
    }
    .or(parse_query(query)?);

    handle_hook(&state, params, headers, body).await
}

async fn handle_hook_query(
    State(state): State<AppState>,
    query: Result<Query<HookParams>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<HookOutcome, HookError> {
    handle_hook(&state, parse_query(query)?, headers, body).await
}

fn parse_query(query: Result<Query<HookParams>, QueryRejection>) -> Result<HookParams, HookError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| HookError::InvalidQuery {
            message: rejection.body_text(),
        })
}

async fn handle_hook(
    state: &AppState,
    params: HookParams,
    headers: HeaderMap,
    body: Bytes,
) -> Result<HookOutcome, HookError> {
    let request = WebhookRequest::new(header_map(&headers), body);
    let outcome = process_hook(state, &params, &request).await?;

    info!(outcome = %outcome, "Webhook accepted");
    Ok(outcome)
}

/// Copy headers into a plain map, dropping values that are not valid UTF-8
fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

// ============================================================================
// Health Handlers
// ============================================================================

async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
