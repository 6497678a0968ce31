//! GitHub webhook provider.
//!
//! This module provides [`GithubProvider`], the [`WebhookProvider`]
//! implementation for GitHub webhooks. It reads the `X-GitHub-Event` header
//! and the JSON body and turns:
//!
//! | Event          | Condition                                   | Result          |
//! |----------------|---------------------------------------------|-----------------|
//! | `ping`         | always                                      | skip            |
//! | `push`         | branch or tag ref with a head commit        | one trigger     |
//! | `push`         | ref deleted                                 | skip            |
//! | `pull_request` | opened, reopened, synchronize, base edited  | one trigger     |
//! | `pull_request` | any other action, closed or merged          | skip            |
//! | anything else  |                                             | error           |
//!
//! # Provider ID
//!
//! [`GithubProvider::PROVIDER_ID`] is `"github"` and must be used when
//! registering this provider with the provider registry.

use crate::{
    trigger::{BuildParams, TriggerParams},
    webhook::{TransformError, TransformResult, WebhookProvider, WebhookRequest},
};
use serde::Deserialize;
use tracing::{debug, instrument};

const EVENT_HEADER: &str = "X-GitHub-Event";
const BRANCH_REF_PREFIX: &str = "refs/heads/";
const TAG_REF_PREFIX: &str = "refs/tags/";

// ============================================================================
// Payload models
// ============================================================================

#[derive(Debug, Deserialize)]
struct PushEvent {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(default)]
    deleted: bool,
    head_commit: Option<Commit>,
}

#[derive(Debug, Deserialize)]
struct Commit {
    id: String,
    #[serde(default)]
    message: String,
    #[serde(default = "default_true")]
    distinct: bool,
}

#[derive(Debug, Deserialize)]
struct PullRequestEvent {
    action: String,
    pull_request: PullRequest,
    #[serde(default)]
    changes: Option<PullRequestChanges>,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    number: u64,
    #[serde(default)]
    state: String,
    #[serde(default)]
    merged: bool,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: Option<String>,
    head: BranchRef,
    base: BranchRef,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    #[serde(rename = "ref")]
    reference: String,
    sha: String,
    repo: Option<RepositoryInfo>,
}

#[derive(Debug, Deserialize)]
struct RepositoryInfo {
    #[serde(default)]
    private: bool,
    clone_url: Option<String>,
    ssh_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PullRequestChanges {
    base: Option<serde_json::Value>,
}

fn default_true() -> bool {
    true
}

// ============================================================================
// GithubProvider
// ============================================================================

/// Webhook provider for GitHub events.
///
/// Stateless: a single instance can be shared across all requests.
///
/// # Examples
///
/// ```rust
/// use hook_relay_core::webhook::{GithubProvider, WebhookProvider, WebhookRequest};
/// use std::collections::HashMap;
///
/// let provider = GithubProvider::new();
/// let request = WebhookRequest::new(HashMap::new(), bytes::Bytes::from_static(b"{}"))
///     .with_header("X-GitHub-Event", "ping")
///     .with_header("Content-Type", "application/json");
///
/// assert!(provider.transform(&request).is_skip());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GithubProvider;

impl GithubProvider {
    /// The canonical provider ID used when registering this provider.
    pub const PROVIDER_ID: &'static str = "github";

    /// Create a new GitHub provider
    pub fn new() -> Self {
        Self
    }

    fn transform_push(&self, payload: PushEvent) -> TransformResult {
        if payload.deleted {
            return TransformResult::skip(
                "This is a 'Deleted' event, no build can be started",
            );
        }

        let Some(head_commit) = payload.head_commit else {
            return TransformError::MissingField {
                field: "head_commit".to_string(),
            }
            .into();
        };

        if !head_commit.distinct {
            return TransformResult::skip("Head commit is not distinct");
        }

        let mut params = if let Some(branch) = payload.reference.strip_prefix(BRANCH_REF_PREFIX) {
            TriggerParams::for_branch(branch)
        } else if let Some(tag) = payload.reference.strip_prefix(TAG_REF_PREFIX) {
            TriggerParams::for_tag(tag)
        } else {
            return TransformError::UnsupportedRef {
                reference: payload.reference,
            }
            .into();
        };

        params.build_params.commit_hash = Some(head_commit.id);
        params.build_params.commit_message = Some(head_commit.message);

        TransformResult::single(params.triggered_by("webhook-github/push"))
    }

    fn transform_pull_request(&self, payload: PullRequestEvent) -> TransformResult {
        let pr = payload.pull_request;

        match payload.action.as_str() {
            "opened" | "reopened" | "synchronize" => {}
            "edited" => {
                let base_changed = payload.changes.is_some_and(|c| c.base.is_some());
                if !base_changed {
                    return TransformResult::skip(
                        "Pull Request edit doesn't require a build: only title and/or description was changed",
                    );
                }
            }
            other => {
                return TransformResult::skip(format!(
                    "Pull Request action doesn't require a build: {other}"
                ));
            }
        }

        if pr.merged {
            return TransformResult::skip("Pull Request already merged");
        }
        if pr.state != "open" {
            return TransformResult::skip(format!(
                "Pull Request state doesn't require a build: {}",
                pr.state
            ));
        }

        let commit_message = match pr.body.as_deref().map(str::trim) {
            Some(body) if !body.is_empty() => format!("{}\n\n{}", pr.title, body),
            _ => pr.title.clone(),
        };

        let repository_url = pr.head.repo.as_ref().and_then(|repo| {
            if repo.private {
                repo.ssh_url.clone()
            } else {
                repo.clone_url.clone()
            }
        });

        let params = TriggerParams {
            build_params: BuildParams {
                commit_hash: Some(pr.head.sha),
                commit_message: Some(commit_message),
                branch: Some(pr.head.reference),
                branch_dest: Some(pr.base.reference),
                pull_request_id: Some(pr.number),
                pull_request_repository_url: repository_url,
                pull_request_merge_branch: Some(format!("pull/{}/merge", pr.number)),
                pull_request_head_branch: Some(format!("pull/{}/head", pr.number)),
                ..BuildParams::default()
            },
            triggered_by: None,
        };

        TransformResult::single(params.triggered_by("webhook-github/pull_request"))
    }
}

// ============================================================================
// WebhookProvider implementation
// ============================================================================

impl WebhookProvider for GithubProvider {
    #[instrument(skip_all, fields(provider = GithubProvider::PROVIDER_ID))]
    fn transform(&self, request: &WebhookRequest) -> TransformResult {
        let Some(event_type) = request.header(EVENT_HEADER) else {
            return TransformError::MissingHeader {
                header: EVENT_HEADER.to_string(),
            }
            .into();
        };

        if !request.is_json() {
            return TransformError::UnsupportedContentType {
                content_type: request.content_type().unwrap_or_default().to_string(),
            }
            .into();
        }

        debug!(event_type = %event_type, "Transforming GitHub webhook");

        match event_type {
            "ping" => TransformResult::skip("GitHub ping event"),
            "push" => match serde_json::from_slice::<PushEvent>(&request.body) {
                Ok(payload) => self.transform_push(payload),
                Err(e) => TransformError::from(e).into(),
            },
            "pull_request" => match serde_json::from_slice::<PullRequestEvent>(&request.body) {
                Ok(payload) => self.transform_pull_request(payload),
                Err(e) => TransformError::from(e).into(),
            },
            other => TransformError::UnsupportedEvent {
                provider: Self::PROVIDER_ID.to_string(),
                event_type: other.to_string(),
            }
            .into(),
        }
    }
}

#[cfg(test)]
#[path = "github_provider_tests.rs"]
mod tests;
