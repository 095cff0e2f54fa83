//! Configuration schema definitions.
//!
//! This module defines the route manifest and router settings.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::loader::ConfigError;
use crate::config::registry::ActionRegistry;
use crate::routing::RawRoute;

/// Root configuration for a router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Route tree, in declaration order.
    pub routes: Vec<RouteConfig>,
}

impl RouterConfig {
    /// Bind handler names and build the route tree.
    pub fn build_routes(&self, registry: &ActionRegistry) -> Result<RawRoute, ConfigError> {
        registry.build(&self.routes)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error, off).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// One node of the declarative route manifest.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RouteConfig {
    /// Path segment.
    pub path: String,

    /// Registered action name (leaves).
    pub action: Option<String>,

    /// Registered middleware name (groups).
    pub middleware: Option<String>,

    /// Static redirect target.
    pub to: Option<String>,

    /// Status adopted when the route matches.
    pub status: Option<u16>,

    /// Nested routes.
    pub childs: Option<Vec<RouteConfig>>,

    /// Extra fields copied onto the compiled route.
    pub meta: Map<String, Value>,
}
