//! Configuration types for the HTTP service

use crate::errors::ConfigError;
use hook_relay_core::trigger::{TriggerMode, TriggerUrlResolver};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use tracing::info;
use url::Url;

/// Environment variable prefix for configuration overrides
///
/// `HOOK_RELAY__SERVER__PORT=9090` sets `server.port`.
pub const ENV_PREFIX: &str = "HOOK_RELAY";

/// Environment variable naming an explicit configuration file
pub const CONFIG_FILE_ENV: &str = "HOOK_RELAY_CONFIG_FILE";

const SYSTEM_CONFIG_PATH: &str = "/etc/hook-relay/service";
const LOCAL_CONFIG_PATH: &str = "config/service";

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Downstream build trigger settings
    pub trigger: TriggerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl ServerConfig {
    /// `host:port` string to bind the listener to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentMode {
    #[default]
    Development,
    Production,
}

/// Build trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Base URL the canonical trigger endpoint is derived from
    pub base_url: String,

    /// Send every trigger to this URL instead of the canonical endpoint
    ///
    /// Setting this also enables real trigger calls outside production.
    pub send_request_to_url: Option<String>,

    pub environment: EnvironmentMode,

    /// Timeout for a single trigger API call
    pub timeout_seconds: u64,

    pub user_agent: String,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.bitrise.io".to_string(),
            send_request_to_url: None,
            environment: EnvironmentMode::default(),
            timeout_seconds: 30,
            user_agent: concat!("hook-relay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TriggerConfig {
    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        parse_url("trigger.base_url", &self.base_url)
    }

    /// Parsed override URL; an empty value counts as unset
    pub fn override_url(&self) -> Result<Option<Url>, ConfigError> {
        match self.send_request_to_url.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_url("trigger.send_request_to_url", raw).map(Some),
        }
    }

    /// Build the resolver for trigger endpoints
    pub fn resolver(&self) -> Result<TriggerUrlResolver, ConfigError> {
        Ok(TriggerUrlResolver::new(
            self.base_url()?,
            self.override_url()?,
        ))
    }

    /// Whether trigger calls are sent or only logged
    pub fn mode(&self) -> TriggerMode {
        let has_override = self
            .send_request_to_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());

        TriggerMode::select(has_override, self.environment == EnvironmentMode::Production)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive used when `RUST_LOG` is unset
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from files and the environment, then validate it
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. `/etc/hook-relay/service.yaml` (optional)
    /// 2. `config/service.yaml` (optional)
    /// 3. `explicit`, when given (required)
    /// 4. `HOOK_RELAY__*` environment variables
    ///
    /// # Errors
    ///
    /// [`ConfigError::Load`] if a source cannot be read or deserialized and
    /// [`ConfigError::Invalid`] if the result fails [`ServiceConfig::validate`].
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(
                config::File::with_name(SYSTEM_CONFIG_PATH)
                    .required(false)
                    .format(config::FileFormat::Yaml),
            )
            .add_source(
                config::File::with_name(LOCAL_CONFIG_PATH)
                    .required(false)
                    .format(config::FileFormat::Yaml),
            );

        if let Some(path) = explicit {
            info!(path = %path.display(), "Loading configuration from explicit path");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: ServiceConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port must not be 0"));
        }
        if self.server.max_body_size == 0 {
            return Err(invalid("server.max_body_size must not be 0"));
        }
        if self.trigger.timeout_seconds == 0 {
            return Err(invalid("trigger.timeout_seconds must not be 0"));
        }
        if self.trigger.user_agent.trim().is_empty() {
            return Err(invalid("trigger.user_agent must not be empty"));
        }

        self.trigger.base_url()?;
        self.trigger.override_url()?;

        Ok(())
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| invalid(format!("{key} '{raw}' is not a URL: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(invalid(format!(
            "{key} must use http or https, got '{scheme}'"
        ))),
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
