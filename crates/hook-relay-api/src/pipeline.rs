//! Per-request hook processing.
//!
//! Takes the caller parameters and the raw webhook through provider lookup,
//! transformation, URL resolution and dispatch, and classifies the result as
//! a [`HookOutcome`] or a [`HookError`].

use crate::{errors::HookError, outcome::HookOutcome, AppState};
use hook_relay_core::{
    webhook::{TransformResult, WebhookRequest},
    ValidationError,
};
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// Caller-supplied parameters of a hook request
///
/// Values may come from the path, the query string, or both; empty strings
/// count as absent.
#[derive(Default, Clone, PartialEq, Eq, Deserialize)]
pub struct HookParams {
    pub service_id: Option<String>,
    pub app_slug: Option<String>,
    pub api_token: Option<String>,
}

impl std::fmt::Debug for HookParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookParams")
            .field("service_id", &self.service_id)
            .field("app_slug", &self.app_slug)
            .field("api_token", &self.api_token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Parameters after presence checks
#[derive(Clone, Copy)]
pub struct ValidatedParams<'a> {
    pub service_id: &'a str,
    pub app_slug: &'a str,
    pub api_token: &'a str,
}

impl HookParams {
    /// Fill any value missing from `self` with the one from `fallback`
    pub fn or(self, fallback: HookParams) -> Self {
        Self {
            service_id: non_empty(self.service_id).or(non_empty(fallback.service_id)),
            app_slug: non_empty(self.app_slug).or(non_empty(fallback.app_slug)),
            api_token: non_empty(self.api_token).or(non_empty(fallback.api_token)),
        }
    }

    /// Check that all three parameters are present
    ///
    /// # Errors
    ///
    /// [`ValidationError::Required`] naming the first missing parameter,
    /// checked in the order `service_id`, `app_slug`, `api_token`.
    pub fn validate(&self) -> Result<ValidatedParams<'_>, ValidationError> {
        Ok(ValidatedParams {
            service_id: required("service_id", &self.service_id)?,
            app_slug: required("app_slug", &self.app_slug)?,
            api_token: required("api_token", &self.api_token)?,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, ValidationError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::Required {
            field: field.to_string(),
        }),
    }
}

/// Process one hook request end to end
#[instrument(
    skip_all,
    fields(service_id = params.service_id.as_deref().unwrap_or_default())
)]
pub async fn process_hook(
    state: &AppState,
    params: &HookParams,
    request: &WebhookRequest,
) -> Result<HookOutcome, HookError> {
    let params = params.validate()?;

    let provider =
        state
            .registry
            .get(params.service_id)
            .ok_or_else(|| HookError::UnsupportedProvider {
                provider: params.service_id.to_string(),
            })?;

    let triggers = match provider.transform(request) {
        TransformResult::Skip { reason } => {
            info!(reason = %reason, "Webhook acknowledged without a build");
            return Ok(HookOutcome::Skipped { reason });
        }
        TransformResult::Error(error) => {
            debug!(error = %error, "Webhook transform failed");
            return Err(HookError::Transform(error));
        }
        TransformResult::Triggers(triggers) => triggers,
    };

    let url = state.resolver.resolve(params.app_slug)?;

    if triggers.is_empty() {
        return Err(HookError::NoEventDetected);
    }

    let report = state
        .dispatcher
        .dispatch(&url, params.api_token, &triggers)
        .await;

    if report.is_success() {
        Ok(HookOutcome::Triggered {
            count: report.attempted,
        })
    } else {
        Err(HookError::Dispatch(report.errors))
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
