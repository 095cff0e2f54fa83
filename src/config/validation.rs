//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route shapes (leaf vs group) before any handler is bound
//! - Validate value ranges (status codes, log level)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Handler names are checked later, when a registry binds them

use thiserror::Error;

use crate::config::schema::{RouteConfig, RouterConfig};

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// A single semantic problem in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route `{path}`: status {status} is outside 100..=599")]
    InvalidStatus { path: String, status: u16 },

    #[error("route `{path}` has neither an action nor a redirect target")]
    EmptyLeaf { path: String },

    #[error("route `{path}` declares both an action and a redirect target")]
    AmbiguousLeaf { path: String },

    #[error("group route `{path}` cannot declare a redirect target")]
    GroupRedirect { path: String },

    #[error("group route `{path}` must use middleware instead of an action")]
    GroupAction { path: String },

    #[error("leaf route `{path}` declares middleware but has no children")]
    LeafMiddleware { path: String },

    #[error("group route `{path}` has no children")]
    EmptyGroup { path: String },

    #[error("unknown log level `{0}`")]
    InvalidLogLevel(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    for route in &config.routes {
        validate_route(route, "", &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_route(route: &RouteConfig, parent: &str, errors: &mut Vec<ValidationError>) {
    let path = join_path(parent, &route.path);

    if let Some(status) = route.status {
        if !(100..=599).contains(&status) {
            errors.push(ValidationError::InvalidStatus {
                path: path.clone(),
                status,
            });
        }
    }

    match &route.childs {
        Some(childs) => {
            if childs.is_empty() {
                errors.push(ValidationError::EmptyGroup { path: path.clone() });
            }
            if route.to.is_some() {
                errors.push(ValidationError::GroupRedirect { path: path.clone() });
            }
            if route.action.is_some() {
                errors.push(ValidationError::GroupAction { path: path.clone() });
            }
            for child in childs {
                validate_route(child, &path, errors);
            }
        }
        None => {
            if route.middleware.is_some() {
                errors.push(ValidationError::LeafMiddleware { path: path.clone() });
            }
            match (&route.action, &route.to) {
                (Some(_), Some(_)) => errors.push(ValidationError::AmbiguousLeaf { path }),
                (None, None) => errors.push(ValidationError::EmptyLeaf { path }),
                _ => {}
            }
        }
    }
}

/// Append a slash-trimmed segment to an absolute parent path.
pub(crate) fn join_path(parent: &str, segment: &str) -> String {
    let parent = parent.trim_end_matches('/');
    let segment = segment.trim_matches('/');
    match (parent.is_empty(), segment.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{segment}"),
        (false, true) => parent.to_string(),
        (false, false) => format!("{parent}/{segment}"),
    }
}
