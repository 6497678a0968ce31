//! # Trigger Dispatch
//!
//! Fans a batch of [`TriggerParams`] out to a [`TriggerApi`].
//!
//! Every descriptor is attempted, in input order, regardless of how earlier
//! attempts went. Failures are collected into a [`DispatchReport`] instead of
//! aborting the batch, so the caller always learns about each failed build
//! individually.

use crate::trigger::{TriggerApi, TriggerError, TriggerParams};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use url::Url;

/// Message reported when a batch contains no trigger descriptors
pub const NO_EVENT_DETECTED_MESSAGE: &str =
    "After processing the webhook we failed to detect any event in it which could be turned into a build.";

// ============================================================================
// Core Types
// ============================================================================

/// Aggregated result of dispatching one batch
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Number of downstream calls that were attempted
    pub attempted: usize,

    /// One entry per failed attempt, in input order
    pub errors: Vec<DispatchError>,
}

impl DispatchReport {
    /// Check if every attempted trigger succeeded
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of attempts that succeeded
    pub fn succeeded(&self) -> usize {
        self.attempted.saturating_sub(self.errors.len())
    }
}

/// A failure recorded for one dispatched trigger
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{}", NO_EVENT_DETECTED_MESSAGE)]
    NoEventDetected,

    #[error("Failed to trigger the build: {source}")]
    TriggerFailed {
        /// Position of the descriptor within the batch
        index: usize,
        #[source]
        source: TriggerError,
    },
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Submits trigger descriptors to the trigger API one by one
///
/// Calls run sequentially in input order. The dispatcher never stops early:
/// the number of downstream calls always equals the number of descriptors.
///
/// # Examples
///
/// ```rust,no_run
/// use hook_relay_core::{dispatch::TriggerDispatcher, trigger::LoggingTriggerApi};
/// use std::sync::Arc;
///
/// let dispatcher = TriggerDispatcher::new(Arc::new(LoggingTriggerApi::new()));
/// # let _ = dispatcher;
/// ```
#[derive(Clone)]
pub struct TriggerDispatcher {
    api: Arc<dyn TriggerApi>,
}

impl TriggerDispatcher {
    /// Create a dispatcher that sends through `api`
    pub fn new(api: Arc<dyn TriggerApi>) -> Self {
        Self { api }
    }

    /// Attempt every descriptor and collect the failures
    ///
    /// An empty batch yields a single [`DispatchError::NoEventDetected`]
    /// without calling the trigger API.
    #[instrument(skip_all, fields(url = %url, trigger_count = params.len()))]
    pub async fn dispatch(
        &self,
        url: &Url,
        api_token: &str,
        params: &[TriggerParams],
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        if params.is_empty() {
            report.errors.push(DispatchError::NoEventDetected);
            return report;
        }

        for (index, trigger) in params.iter().enumerate() {
            report.attempted += 1;

            if let Err(source) = self.api.trigger(url, api_token, trigger).await {
                warn!(index, error = %source, "Build trigger failed");
                report
                    .errors
                    .push(DispatchError::TriggerFailed { index, source });
            }
        }

        info!(
            attempted = report.attempted,
            failed = report.errors.len(),
            "Dispatched build triggers"
        );

        report
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
