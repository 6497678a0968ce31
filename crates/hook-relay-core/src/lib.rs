//! # Hook Relay Core
//!
//! Domain logic for turning inbound webhooks into build trigger requests.
//!
//! This crate contains the provider abstraction that classifies a raw webhook,
//! the trigger descriptors sent to the downstream build API, and the dispatcher
//! that fans a batch of triggers out while collecting per-item failures.
//!
//! ## Architecture
//!
//! - Business logic depends only on trait abstractions ([`WebhookProvider`],
//!   [`TriggerApi`])
//! - Infrastructure implementations are injected at startup
//! - No state is shared between requests apart from immutable configuration
//!
//! ## Usage
//!
//! ```rust
//! use hook_relay_core::webhook::{GithubProvider, WebhookProvider};
//!
//! let provider = GithubProvider::new();
//! assert_eq!(GithubProvider::PROVIDER_ID, "github");
//! # let _ = provider;
//! ```

use serde::{Deserialize, Serialize};

/// Error type for input validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Missing required parameter: {field}")]
    Required { field: String },
}

// ============================================================================
// Module declarations
// ============================================================================

/// Webhook request model, provider contract, and provider adapters
pub mod webhook;

/// Build trigger descriptors, URL resolution, and trigger API clients
pub mod trigger;

/// Fan-out of trigger descriptors to the trigger API
pub mod dispatch;

// Re-export key types for convenience
pub use dispatch::{DispatchError, DispatchReport, TriggerDispatcher};
pub use trigger::{
    BuildParams, HttpTriggerApi, LoggingTriggerApi, TriggerApi, TriggerError, TriggerMode,
    TriggerParams, TriggerUrlError, TriggerUrlResolver,
};
pub use webhook::{TransformError, TransformResult, WebhookProvider, WebhookRequest};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
