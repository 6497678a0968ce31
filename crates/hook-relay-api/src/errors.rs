//! Error types for the HTTP service

use crate::responses::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use hook_relay_core::{
    dispatch::{DispatchError, NO_EVENT_DETECTED_MESSAGE},
    trigger::TriggerUrlError,
    webhook::TransformError,
    ValidationError,
};
use tracing::warn;

/// Reasons a hook request is rejected
///
/// Every variant maps to `400 Bad Request` with an `{"errors": [...]}` body.
/// [`HookError::Dispatch`] contributes one entry per failed trigger; all other
/// variants contribute exactly one.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// A caller parameter (`service_id`, `app_slug`, `api_token`) is absent
    #[error(transparent)]
    MissingParameter(#[from] ValidationError),

    /// The query string could not be parsed
    #[error("Invalid query string: {message}")]
    InvalidQuery { message: String },

    #[error("Unsupported webhook provider: {provider}")]
    UnsupportedProvider { provider: String },

    #[error("Failed to transform the webhook: {0}")]
    Transform(#[from] TransformError),

    /// The provider returned no triggers and neither skipped nor failed
    #[error("{}", NO_EVENT_DETECTED_MESSAGE)]
    NoEventDetected,

    #[error("Failed to create build trigger URL: {0}")]
    UrlResolution(#[from] TriggerUrlError),

    #[error("Failed to trigger {} of the requested builds", .0.len())]
    Dispatch(Vec<DispatchError>),
}

impl HookError {
    /// Messages reported to the caller, in order
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Dispatch(errors) => errors.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        }
    }
}

impl IntoResponse for HookError {
    fn into_response(self) -> Response {
        let errors = self.messages();
        warn!(error_count = errors.len(), errors = ?errors, "Rejecting webhook");

        (StatusCode::BAD_REQUEST, Json(ErrorResponse { errors })).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl ServiceError {
    /// Process exit code reported for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BindFailed { .. } => 1,
            Self::ServerFailed { .. } => 2,
            Self::Configuration(_) => 3,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
