//! Accepted outcomes of a hook request.
//!
//! Rejections are [`HookError`](crate::errors::HookError); this module covers
//! the two ways a request can succeed.

use crate::responses::SuccessResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::fmt;

/// Successful result of processing one hook request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// The provider recognised the event but decided not to build
    Skipped { reason: String },

    /// Every trigger was accepted by the trigger API
    Triggered { count: usize },
}

impl fmt::Display for HookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped { reason } => {
                write!(f, "Acknowledged, but skipping. Reason: {reason}")
            }
            Self::Triggered { count: 1 } => f.write_str("Successfully triggered 1 build."),
            Self::Triggered { count } => write!(f, "Successfully triggered {count} builds."),
        }
    }
}

impl IntoResponse for HookOutcome {
    fn into_response(self) -> Response {
        let body = SuccessResponse {
            message: self.to_string(),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
