//! Log-only implementation of [`TriggerApi`].

use super::{TriggerApi, TriggerError, TriggerParams, TriggerRequestBody};
use async_trait::async_trait;
use tracing::info;
use url::Url;

/// [`TriggerApi`] that validates and logs trigger requests without sending them
///
/// Used outside production when no override URL is configured. The API token
/// is replaced with a placeholder before the body is logged.
#[derive(Debug, Clone, Default)]
pub struct LoggingTriggerApi;

impl LoggingTriggerApi {
    /// Placeholder written in place of the API token
    pub const REDACTED: &'static str = "<REDACTED>";

    /// Create a new log-only trigger API
    pub fn new() -> Self {
        Self
    }

    /// Render the body that would be posted, with the token redacted
    pub fn render_body(params: &TriggerParams) -> Result<String, TriggerError> {
        let body = TriggerRequestBody::new(Self::REDACTED, params);
        Ok(serde_json::to_string(&body)?)
    }
}

#[async_trait]
impl TriggerApi for LoggingTriggerApi {
    async fn trigger(
        &self,
        url: &Url,
        _api_token: &str,
        params: &TriggerParams,
    ) -> Result<(), TriggerError> {
        params.validate()?;

        let body = Self::render_body(params)?;
        info!(url = %url, body = %body, "Log-only mode: build trigger not sent");

        Ok(())
    }
}
