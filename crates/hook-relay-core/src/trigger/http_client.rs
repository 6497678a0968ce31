//! HTTP implementation of [`TriggerApi`].

use super::{TriggerApi, TriggerError, TriggerParams, TriggerRequestBody, TriggerResponse};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, instrument, warn};
use url::Url;

/// [`TriggerApi`] that posts trigger requests over HTTP
///
/// The request timeout is enforced by the underlying `reqwest` client; a
/// timed-out call surfaces as [`TriggerError::Transport`].
///
/// # Examples
///
/// ```rust,no_run
/// use hook_relay_core::trigger::HttpTriggerApi;
/// use std::time::Duration;
///
/// let api = HttpTriggerApi::new(Duration::from_secs(10), "hook-relay/0.1.0").unwrap();
/// # let _ = api;
/// ```
#[derive(Debug, Clone)]
pub struct HttpTriggerApi {
    client: reqwest::Client,
}

impl HttpTriggerApi {
    /// Build a client with the given request timeout and user agent
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::Transport`] if the HTTP client cannot be
    /// constructed (for example when the TLS backend fails to initialise).
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TriggerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl TriggerApi for HttpTriggerApi {
    #[instrument(skip_all, fields(url = %url))]
    async fn trigger(
        &self,
        url: &Url,
        api_token: &str,
        params: &TriggerParams,
    ) -> Result<(), TriggerError> {
        params.validate()?;

        let body = TriggerRequestBody::new(api_token, params);
        let response = self.client.post(url.clone()).json(&body).send().await?;

        let status = response.status();
        let text = response.text().await?;
        let parsed: Option<TriggerResponse> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let message = parsed
                .and_then(|r| r.message)
                .unwrap_or_else(|| text.trim().to_string());

            warn!(
                status = status.as_u16(),
                message = %message,
                "Trigger API rejected the build request"
            );

            return Err(TriggerError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let response = parsed.unwrap_or_default();
        info!(
            status = status.as_u16(),
            build_number = ?response.build_number,
            build_url = ?response.build_url,
            triggered_workflow = ?response.triggered_workflow,
            "Build triggered"
        );

        Ok(())
    }
}

#[cfg(test)]
#[path = "http_client_tests.rs"]
mod tests;
