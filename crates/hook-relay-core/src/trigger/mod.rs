//! # Build Trigger Module
//!
//! Provider-agnostic build trigger descriptors and the client contract for the
//! downstream build trigger API.
//!
//! The descriptors are opaque to the relay: providers fill them in and the
//! [`TriggerApi`] forwards them unchanged. The module also owns resolution of
//! the trigger endpoint ([`TriggerUrlResolver`]) and the choice between real
//! and log-only trigger calls ([`TriggerMode`]).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

mod http_client;
mod logging;

pub use http_client::HttpTriggerApi;
pub use logging::LoggingTriggerApi;

/// Hook type reported to the trigger API in every request body
pub const HOOK_INFO_TYPE: &str = "bitrise";

// ============================================================================
// Core Types
// ============================================================================

/// Build parameters forwarded to the trigger API
///
/// Every field is optional; providers set what their event carries. At least
/// one of `branch`, `tag`, or `workflow_id` must be present before a trigger
/// can be sent (see [`TriggerParams::validate`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_dest: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_id: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_repository_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_merge_branch: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_head_branch: Option<String>,
}

/// Descriptor of one build to start
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerParams {
    pub build_params: BuildParams,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<String>,
}

impl TriggerParams {
    /// Create trigger parameters for a branch build
    pub fn for_branch(branch: impl Into<String>) -> Self {
        Self {
            build_params: BuildParams {
                branch: Some(branch.into()),
                ..BuildParams::default()
            },
            triggered_by: None,
        }
    }

    /// Create trigger parameters for a tag build
    pub fn for_tag(tag: impl Into<String>) -> Self {
        Self {
            build_params: BuildParams {
                tag: Some(tag.into()),
                ..BuildParams::default()
            },
            triggered_by: None,
        }
    }

    /// Set the `triggered_by` marker
    pub fn triggered_by(mut self, source: impl Into<String>) -> Self {
        self.triggered_by = Some(source.into());
        self
    }

    /// Check that the trigger API can select a build from these parameters
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::InvalidParams`] when none of `branch`, `tag`,
    /// or `workflow_id` carries a non-empty value.
    pub fn validate(&self) -> Result<(), TriggerError> {
        let has_value = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());

        let params = &self.build_params;
        if has_value(&params.branch) || has_value(&params.tag) || has_value(&params.workflow_id)
        {
            Ok(())
        } else {
            Err(TriggerError::InvalidParams {
                message: "missing branch, tag and workflow_id; at least one is required"
                    .to_string(),
            })
        }
    }
}

/// Body posted to the trigger API
#[derive(Debug, Serialize)]
pub(crate) struct TriggerRequestBody<'a> {
    hook_info: HookInfo<'a>,
    build_params: &'a BuildParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    triggered_by: Option<&'a str>,
}

#[derive(Serialize)]
struct HookInfo<'a> {
    #[serde(rename = "type")]
    hook_type: &'static str,
    api_token: &'a str,
}

impl std::fmt::Debug for HookInfo<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookInfo")
            .field("hook_type", &self.hook_type)
            .field("api_token", &LoggingTriggerApi::REDACTED)
            .finish()
    }
}

impl<'a> TriggerRequestBody<'a> {
    pub(crate) fn new(api_token: &'a str, params: &'a TriggerParams) -> Self {
        Self {
            hook_info: HookInfo {
                hook_type: HOOK_INFO_TYPE,
                api_token,
            },
            build_params: &params.build_params,
            triggered_by: params.triggered_by.as_deref(),
        }
    }
}

/// Response returned by the trigger API
///
/// All fields are optional so that partial or error responses still parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub slug: Option<String>,
    pub service: Option<String>,
    pub build_slug: Option<String>,
    pub build_number: Option<u64>,
    pub build_url: Option<String>,
    pub triggered_workflow: Option<String>,
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors from a single trigger API call
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("Invalid trigger parameters: {message}")]
    InvalidParams { message: String },

    #[error("Failed to serialize trigger request: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Trigger request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Trigger API responded with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Errors while resolving the trigger endpoint for an application
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriggerUrlError {
    #[error("application identifier must not be empty")]
    EmptyAppSlug,

    #[error("base URL '{url}' cannot have path segments appended")]
    CannotBeABase { url: String },
}

// ============================================================================
// Core Operations (Traits)
// ============================================================================

/// Client contract for the downstream build trigger API
///
/// One call starts one build. Timeouts are the implementation's concern.
#[async_trait]
pub trait TriggerApi: Send + Sync {
    /// Submit one trigger descriptor to `url`, authenticated by `api_token`
    async fn trigger(
        &self,
        url: &Url,
        api_token: &str,
        params: &TriggerParams,
    ) -> Result<(), TriggerError>;
}

// ============================================================================
// Trigger URL Resolution
// ============================================================================

/// Resolves the trigger endpoint for an application
///
/// When an override URL is configured every request goes there unchanged;
/// otherwise the canonical `{base}/app/{app_slug}/build/start.json` endpoint
/// is derived.
///
/// # Examples
///
/// ```rust
/// use hook_relay_core::trigger::TriggerUrlResolver;
/// use url::Url;
///
/// let resolver = TriggerUrlResolver::new(Url::parse("https://www.bitrise.io").unwrap(), None);
/// let url = resolver.resolve("my-app").unwrap();
/// assert_eq!(url.as_str(), "https://www.bitrise.io/app/my-app/build/start.json");
/// ```
#[derive(Debug, Clone)]
pub struct TriggerUrlResolver {
    base_url: Url,
    override_url: Option<Url>,
}

impl TriggerUrlResolver {
    /// Create a resolver with a canonical base URL and optional override
    pub fn new(base_url: Url, override_url: Option<Url>) -> Self {
        Self {
            base_url,
            override_url,
        }
    }

    /// Whether every request is sent to a fixed override URL
    pub fn has_override(&self) -> bool {
        self.override_url.is_some()
    }

    /// Resolve the trigger endpoint for `app_slug`
    ///
    /// # Errors
    ///
    /// Returns [`TriggerUrlError`] if no override is configured and the
    /// canonical endpoint cannot be derived.
    pub fn resolve(&self, app_slug: &str) -> Result<Url, TriggerUrlError> {
        if let Some(url) = &self.override_url {
            return Ok(url.clone());
        }

        if app_slug.trim().is_empty() {
            return Err(TriggerUrlError::EmptyAppSlug);
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TriggerUrlError::CannotBeABase {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(["app", app_slug, "build", "start.json"]);

        Ok(url)
    }
}

// ============================================================================
// Trigger Mode
// ============================================================================

/// Whether trigger calls reach the downstream API or are only logged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Serialise and log each trigger without sending it
    LogOnly,

    /// Send each trigger to the downstream API
    Live,
}

impl TriggerMode {
    /// Select the mode from configuration
    ///
    /// Calls are live when an override URL is configured or the service
    /// runs in production; every other deployment only logs.
    pub fn select(override_configured: bool, production: bool) -> Self {
        if override_configured || production {
            Self::Live
        } else {
            Self::LogOnly
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
