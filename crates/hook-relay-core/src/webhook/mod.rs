//! # Webhook Module
//!
//! Raw webhook request model and the provider capability contract.
//!
//! A provider inspects a [`WebhookRequest`] and classifies it into a
//! [`TransformResult`]: skip it, reject it, or turn it into one or more build
//! trigger descriptors. Providers never perform I/O; dispatching the resulting
//! triggers is the job of [`crate::dispatch::TriggerDispatcher`].

use bytes::Bytes;
use std::collections::HashMap;

mod github_provider;
mod transform;

pub use github_provider::GithubProvider;
pub use transform::{TransformError, TransformResult};

// ============================================================================
// Core Types
// ============================================================================

/// Raw HTTP request data received from a webhook source
///
/// Header names are stored lowercased so providers can look them up without
/// caring how the sender capitalised them.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    headers: HashMap<String, String>,
    pub body: Bytes,
}

impl WebhookRequest {
    /// Create new webhook request from a header map and body
    pub fn new(headers: HashMap<String, String>, body: Bytes) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        Self { headers, body }
    }

    /// Add or replace a header, returning the updated request
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Look up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Content type of the request, if the sender supplied one
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Whether the body is declared as JSON
    pub fn is_json(&self) -> bool {
        self.content_type()
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("application/json"))
            .unwrap_or(false)
    }
}

// ============================================================================
// Core Operations (Traits)
// ============================================================================

/// Capability every webhook source adapter implements
///
/// Implementations must be pure with respect to the request: the same
/// headers and body always produce an equal [`TransformResult`], and no
/// network or state-mutating side effects take place. A provider must
/// distinguish three outcomes:
///
/// - a recognised event that needs no build → [`TransformResult::Skip`]
/// - a malformed or unparseable payload → [`TransformResult::Error`]
/// - one or more actionable events → [`TransformResult::Triggers`]
///
/// # Examples
///
/// ```rust
/// use hook_relay_core::webhook::{TransformResult, WebhookProvider, WebhookRequest};
///
/// struct AlwaysSkip;
///
/// impl WebhookProvider for AlwaysSkip {
///     fn transform(&self, _request: &WebhookRequest) -> TransformResult {
///         TransformResult::skip("nothing to build")
///     }
/// }
/// ```
pub trait WebhookProvider: Send + Sync {
    /// Classify a raw webhook request
    fn transform(&self, request: &WebhookRequest) -> TransformResult;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
