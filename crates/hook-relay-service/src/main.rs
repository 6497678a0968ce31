//! # Hook Relay Service
//!
//! Binary entry point for the Hook Relay HTTP service.
//!
//! This executable:
//! - Loads configuration from files and the environment
//! - Initializes structured logging
//! - Registers the webhook providers and picks the trigger API strategy
//! - Starts the HTTP server from hook-relay-api
//!
//! Exit codes: 1 bind failure, 2 server failure, 3 configuration error.

use anyhow::Context;
use hook_relay_api::{
    config::CONFIG_FILE_ENV, start_server, ConfigError, LoggingConfig, ProviderId,
    ProviderRegistry, ServiceConfig, TriggerConfig,
};
use hook_relay_core::{
    trigger::{HttpTriggerApi, LoggingTriggerApi, TriggerApi, TriggerMode},
    webhook::GithubProvider,
};
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CONFIG_EXIT_CODE: i32 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let explicit_path = std::env::var_os(CONFIG_FILE_ENV)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from);

    let config = match ServiceConfig::load(explicit_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!(error = %e, "Service configuration is invalid; aborting");
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };

    init_tracing(&config.logging);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Hook Relay service");

    let registry = build_registry().context("Failed to register webhook providers")?;
    info!(providers = ?registry.ids(), "Registered webhook providers");

    let trigger_api = match build_trigger_api(&config.trigger) {
        Ok(api) => api,
        Err(e) => {
            error!(error = %e, "Failed to create the trigger API client; aborting");
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };

    info!(
        host = %config.server.host,
        port = config.server.port,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(config, registry, trigger_api).await {
        error!(error = %e, "HTTP server stopped with an error");
        std::process::exit(e.exit_code());
    }

    Ok(())
}

// ============================================================================
// Private helpers
// ============================================================================

/// Default filter used when `RUST_LOG` is not set
fn default_directives(level: &str) -> String {
    format!(
        "hook_relay_service={level},hook_relay_api={level},hook_relay_core={level},tower_http=debug"
    )
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json_format {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Register every built-in webhook provider
fn build_registry() -> anyhow::Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    registry.register(
        ProviderId::new(GithubProvider::PROVIDER_ID)?,
        Arc::new(GithubProvider::new()),
    );
    Ok(registry)
}

/// Pick the trigger API strategy for the configured mode
fn build_trigger_api(config: &TriggerConfig) -> Result<Arc<dyn TriggerApi>, ConfigError> {
    match config.mode() {
        TriggerMode::LogOnly => {
            warn!("Running in log-only mode; build triggers will be logged but not sent");
            Ok(Arc::new(LoggingTriggerApi::new()))
        }
        TriggerMode::Live => {
            let api = HttpTriggerApi::new(config.timeout(), &config.user_agent).map_err(|e| {
                ConfigError::Invalid {
                    message: format!("Failed to build the trigger HTTP client: {e}"),
                }
            })?;
            info!(
                override_url = ?config.send_request_to_url,
                timeout_seconds = config.timeout_seconds,
                "Build triggers will be sent to the trigger API"
            );
            Ok(Arc::new(api))
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
