//! Lookup table from service identifiers to webhook providers.
//!
//! The registry is filled in once at startup and then moved behind an `Arc`
//! in the router state, so request handlers only ever read from it.
//!
//! A provider registered as `"github"` serves:
//! ```text
//! POST /h/github/{app_slug}/{api_token}
//! ```

use hook_relay_core::webhook::WebhookProvider;
use std::{borrow::Borrow, collections::HashMap, fmt, sync::Arc};

// ============================================================================
// ProviderId
// ============================================================================

/// Service identifier a provider is registered under.
///
/// Identifiers are used verbatim as URL path segments, so only lowercase
/// ASCII letters, digits, `-` and `_` are accepted.
///
/// # Examples
///
/// ```rust
/// use hook_relay_api::provider_registry::ProviderId;
///
/// assert_eq!(ProviderId::new("github").unwrap().as_str(), "github");
/// assert!(ProviderId::new("GitHub").is_err());
/// assert!(ProviderId::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderId(String);

impl ProviderId {
    /// Validate and wrap a service identifier.
    ///
    /// # Errors
    ///
    /// [`InvalidProviderIdError::Empty`] for an empty value and
    /// [`InvalidProviderIdError::InvalidChars`] for anything outside
    /// `[a-z0-9_-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidProviderIdError> {
        let value = value.into();
        if value.is_empty() {
            return Err(InvalidProviderIdError::Empty);
        }

        let url_safe = value
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_'));
        if !url_safe {
            return Err(InvalidProviderIdError::InvalidChars { value });
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProviderId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rejected service identifier.
#[derive(Debug, thiserror::Error)]
pub enum InvalidProviderIdError {
    #[error("Service identifier must not be empty")]
    Empty,

    #[error("Service identifier '{value}' may only contain [a-z0-9_-]")]
    InvalidChars { value: String },
}

// ============================================================================
// ProviderRegistry
// ============================================================================

/// Maps service identifiers to [`WebhookProvider`] implementations.
///
/// # Examples
///
/// ```rust
/// use hook_relay_api::provider_registry::{ProviderId, ProviderRegistry};
/// use hook_relay_core::webhook::GithubProvider;
/// use std::sync::Arc;
///
/// let mut registry = ProviderRegistry::new();
/// registry.register(ProviderId::new("github").unwrap(), Arc::new(GithubProvider::new()));
///
/// assert!(registry.contains("github"));
/// assert!(registry.get("gitlab").is_none());
/// ```
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, Arc<dyn WebhookProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider, replacing any earlier entry with the same identifier.
    pub fn register(&mut self, id: ProviderId, provider: Arc<dyn WebhookProvider>) -> &mut Self {
        self.providers.insert(id, provider);
        self
    }

    /// Find the provider registered under `service_id`.
    pub fn get(&self, service_id: &str) -> Option<Arc<dyn WebhookProvider>> {
        self.providers.get(service_id).cloned()
    }

    pub fn contains(&self, service_id: &str) -> bool {
        self.providers.contains_key(service_id)
    }

    /// Registered identifiers in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(ProviderId::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.ids())
            .finish()
    }
}

#[cfg(test)]
#[path = "provider_registry_tests.rs"]
mod tests;
