//! Normalised outcome of inspecting one webhook request.
//!
//! | Variant    | Meaning                                    | Caller response |
//! |------------|--------------------------------------------|-----------------|
//! | `Skip`     | Recognised event that needs no build       | accept          |
//! | `Error`    | Malformed or unsupported payload           | reject          |
//! | `Triggers` | Zero or more builds to start               | dispatch        |
//!
//! An empty `Triggers` list is not an error from the provider's point of
//! view; the request pipeline decides that no actionable event was found.

use crate::trigger::TriggerParams;

// ============================================================================
// TransformResult
// ============================================================================

/// Result of [`WebhookProvider::transform`](crate::webhook::WebhookProvider::transform)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformResult {
    /// The event was recognised but should not start a build
    Skip { reason: String },

    /// The request could not be turned into a build
    Error(TransformError),

    /// Builds to start, in the order the provider produced them
    Triggers(Vec<TriggerParams>),
}

impl TransformResult {
    /// Create a skip result with the given reason
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skip {
            reason: reason.into(),
        }
    }

    /// Create a result carrying exactly one trigger
    pub fn single(params: TriggerParams) -> Self {
        Self::Triggers(vec![params])
    }

    /// Check whether this result asks the caller to acknowledge and skip
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip { .. })
    }

    /// Number of triggers carried (zero for skip and error)
    pub fn trigger_count(&self) -> usize {
        match self {
            Self::Triggers(params) => params.len(),
            Self::Skip { .. } | Self::Error(_) => 0,
        }
    }
}

impl From<TransformError> for TransformResult {
    fn from(error: TransformError) -> Self {
        Self::Error(error)
    }
}

// ============================================================================
// TransformError
// ============================================================================

/// Errors a provider reports for requests it cannot classify
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("Missing required header: {header}")]
    MissingHeader { header: String },

    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    #[error("Malformed payload: {message}")]
    MalformedPayload { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Unsupported {provider} event type: {event_type}")]
    UnsupportedEvent { provider: String, event_type: String },

    #[error("Unsupported reference: {reference}")]
    UnsupportedRef { reference: String },
}

impl From<serde_json::Error> for TransformError {
    fn from(error: serde_json::Error) -> Self {
        Self::MalformedPayload {
            message: error.to_string(),
        }
    }
}
