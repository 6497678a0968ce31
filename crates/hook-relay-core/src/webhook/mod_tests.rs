//! Tests for [`WebhookRequest`], [`TransformResult`], and the provider contract.

use super::*;
use crate::trigger::TriggerParams;

fn request_with(headers: &[(&str, &str)], body: &'static str) -> WebhookRequest {
    let headers = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<HashMap<_, _>>();
    WebhookRequest::new(headers, Bytes::from_static(body.as_bytes()))
}

// ============================================================================
// WebhookRequest tests
// ============================================================================

mod webhook_request_tests {
    use super::*;

    /// Verify that header lookups ignore the case used by the sender.
    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = request_with(&[("X-GitHub-Event", "push")], "{}");
        assert_eq!(request.header("x-github-event"), Some("push"));
        assert_eq!(request.header("X-GITHUB-EVENT"), Some("push"));
    }

    /// Verify that missing headers return `None`.
    #[test]
    fn test_missing_header_returns_none() {
        let request = request_with(&[], "{}");
        assert!(request.header("x-github-event").is_none());
        assert!(request.content_type().is_none());
    }

    /// Verify that `with_header` replaces an existing value.
    #[test]
    fn test_with_header_replaces_value() {
        let request = request_with(&[("Content-Type", "text/plain")], "{}")
            .with_header("content-type", "application/json");
        assert_eq!(request.content_type(), Some("application/json"));
    }

    /// Verify JSON detection accepts charset parameters and rejects other types.
    #[test]
    fn test_is_json() {
        let json = request_with(&[("Content-Type", "application/json; charset=utf-8")], "{}");
        assert!(json.is_json());

        let form = request_with(&[("Content-Type", "application/x-www-form-urlencoded")], "");
        assert!(!form.is_json());

        let none = request_with(&[], "");
        assert!(!none.is_json());
    }
}

// ============================================================================
// TransformResult tests
// ============================================================================

mod transform_result_tests {
    use super::*;

    /// Verify the skip constructor and predicate.
    #[test]
    fn test_skip() {
        let result = TransformResult::skip("not relevant");
        assert!(result.is_skip());
        assert_eq!(result.trigger_count(), 0);
        assert_eq!(
            result,
            TransformResult::Skip {
                reason: "not relevant".to_string()
            }
        );
    }

    /// Verify that a transform error converts into the error variant.
    #[test]
    fn test_from_transform_error() {
        let result: TransformResult = TransformError::MissingField {
            field: "ref".to_string(),
        }
        .into();
        assert!(!result.is_skip());
        assert!(matches!(result, TransformResult::Error(_)));
        assert_eq!(result.trigger_count(), 0);
    }

    /// Verify that trigger count reflects the number of descriptors.
    #[test]
    fn test_trigger_count() {
        let result = TransformResult::Triggers(vec![
            TriggerParams::for_branch("main"),
            TriggerParams::for_tag("v1.0.0"),
        ]);
        assert_eq!(result.trigger_count(), 2);
        assert_eq!(TransformResult::Triggers(vec![]).trigger_count(), 0);
    }

    /// Verify that JSON parse failures become malformed-payload errors.
    #[test]
    fn test_json_error_is_malformed_payload() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error = TransformError::from(json_error);
        assert!(matches!(error, TransformError::MalformedPayload { .. }));
        assert!(error.to_string().starts_with("Malformed payload"));
    }
}

// ============================================================================
// Provider contract tests
// ============================================================================

mod provider_contract_tests {
    use super::*;

    /// Deterministic provider that builds one trigger per line of the body.
    struct LineProvider;

    impl WebhookProvider for LineProvider {
        fn transform(&self, request: &WebhookRequest) -> TransformResult {
            let body = match std::str::from_utf8(&request.body) {
                Ok(body) => body,
                Err(e) => {
                    return TransformError::MalformedPayload {
                        message: e.to_string(),
                    }
                    .into()
                }
            };

            if body.trim() == "skip" {
                return TransformResult::skip("asked to skip");
            }

            TransformResult::Triggers(
                body.lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(TriggerParams::for_branch)
                    .collect(),
            )
        }
    }

    /// Verify that transforming identical input twice yields equal results.
    #[test]
    fn test_transform_is_idempotent() {
        let provider = LineProvider;
        let first = provider.transform(&request_with(&[], "main\ndevelop\n"));
        let second = provider.transform(&request_with(&[], "main\ndevelop\n"));

        assert_eq!(first, second);
        assert_eq!(first.trigger_count(), 2);
    }

    /// Verify that a provider may return more than one trigger per request.
    #[test]
    fn test_provider_can_fan_out() {
        let provider = LineProvider;
        let result = provider.transform(&request_with(&[], "a\nb\nc"));

        match result {
            TransformResult::Triggers(params) => {
                let branches: Vec<_> = params
                    .iter()
                    .map(|p| p.build_params.branch.clone().unwrap())
                    .collect();
                assert_eq!(branches, vec!["a", "b", "c"]);
            }
            other => panic!("expected triggers, got {other:?}"),
        }
    }

    /// Verify that providers are usable behind a trait object.
    #[test]
    fn test_provider_is_object_safe() {
        let provider: std::sync::Arc<dyn WebhookProvider> = std::sync::Arc::new(LineProvider);
        assert!(provider.transform(&request_with(&[], "skip")).is_skip());
    }
}
