//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global subscriber for binaries
//! - Provide a hook set that logs every lifecycle phase
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format optional, pretty format by default
//! - `RUST_LOG` overrides the configured level

use async_trait::async_trait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::hooks::{HookOptions, Hooks};
use crate::transition::RouterError;

/// Install the global tracing subscriber.
///
/// Does nothing if a subscriber is already installed.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("path_router={}", config.log_level)));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

/// Hook set that emits one event per lifecycle phase.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHooks;

#[async_trait]
impl Hooks for TracingHooks {
    async fn on_start(&self, options: &HookOptions) -> Result<(), RouterError> {
        tracing::info!(path = %options.path, "Navigation started");
        Ok(())
    }

    async fn on_match(&self, options: &HookOptions) -> Result<(), RouterError> {
        tracing::info!(
            path = %options.path,
            route = options.route.as_ref().map(|r| r.path()).unwrap_or_default(),
            status = ?options.status,
            redirect = ?options.redirect,
            "Route matched"
        );
        Ok(())
    }

    async fn on_resolve(&self, options: &HookOptions) -> Result<(), RouterError> {
        tracing::info!(path = %options.path, status = ?options.status, "Navigation resolved");
        Ok(())
    }

    async fn on_error(&self, options: &HookOptions) {
        if let Some(error) = &options.error {
            tracing::warn!(path = %options.path, status = error.status, message = %error.message, "Navigation failed");
        }
    }

    fn on_cancel(&self) {
        tracing::info!("Navigation cancelled");
    }
}
