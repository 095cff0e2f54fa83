//! Navigation signals and the result envelope.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::location::Location;
use crate::routing::matcher::Params;
use crate::routing::route::Route;
use crate::transition::context::Context;

/// A navigation failure carried as data.
///
/// Produced by the engine for well-known conditions or returned by an action
/// or hook to stop the transition.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message} ({status})")]
pub struct RouterError {
    pub message: String,
    pub status: u16,
}

impl RouterError {
    /// Create an error with a custom message and status.
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    /// No pattern matched the path.
    pub fn not_found() -> Self {
        Self::new("Not Found", 404)
    }

    /// A static or dynamic redirect chain revisited a route.
    pub fn circular_redirect() -> Self {
        Self::new("Circular Redirect", 500)
    }

    /// Another transition holds the single-flight slot.
    pub fn already_running() -> Self {
        Self::new("Already running", 500)
    }

    /// The transition was cancelled while in flight.
    pub fn cancelled() -> Self {
        Self::new("Cancelled", 500)
    }
}

impl Default for RouterError {
    fn default() -> Self {
        Self::new("Internal Error", 500)
    }
}

/// Instructs the engine to restart matching at another path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicRedirect {
    pub path: String,
    pub status: u16,
}

impl DynamicRedirect {
    /// Redirect with the default 302 status.
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_status(path, 302)
    }

    pub fn with_status(path: impl Into<String>, status: u16) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// What an action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Final result of the navigation.
    Done(Value),
    /// Restart matching at another path.
    Redirect(DynamicRedirect),
    /// Stop the navigation with an error.
    Fail(RouterError),
}

impl Outcome {
    pub fn done(value: impl Into<Value>) -> Self {
        Outcome::Done(value.into())
    }

    pub fn redirect(path: impl Into<String>) -> Self {
        Outcome::Redirect(DynamicRedirect::new(path))
    }

    pub fn fail(message: impl Into<String>, status: u16) -> Self {
        Outcome::Fail(RouterError::new(message, status))
    }
}

impl From<RouterError> for Outcome {
    fn from(err: RouterError) -> Self {
        Outcome::Fail(err)
    }
}

impl From<DynamicRedirect> for Outcome {
    fn from(redirect: DynamicRedirect) -> Self {
        Outcome::Redirect(redirect)
    }
}

impl<T: Into<Value>> From<Result<T, RouterError>> for Outcome {
    fn from(result: Result<T, RouterError>) -> Self {
        match result {
            Ok(value) => Outcome::Done(value.into()),
            Err(err) => Outcome::Fail(err),
        }
    }
}

/// The uniform envelope returned by `run` and `resolve`.
///
/// On failure `route`, `params`, `redirect` and `result` are `None` and
/// `error` is set; on success `error` is `None`.
#[derive(Debug, Clone, Serialize)]
pub struct RouterResult {
    pub path: String,
    pub location: Location,
    pub route: Option<Arc<Route>>,
    pub status: u16,
    pub params: Option<Params>,
    pub redirect: Option<String>,
    pub result: Option<Value>,
    pub ctx: Context,
    pub error: Option<RouterError>,
}

impl RouterResult {
    /// Build a failure envelope; the status is taken from the error.
    pub fn failure(path: impl Into<String>, location: Location, ctx: Context, error: RouterError) -> Self {
        Self {
            path: path.into(),
            location,
            route: None,
            status: error.status,
            params: None,
            redirect: None,
            result: None,
            ctx,
            error: Some(error),
        }
    }

    /// Returns true if the navigation settled without an error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_error() {
        let err = RouterError::default();
        assert_eq!(err.message, "Internal Error");
        assert_eq!(err.status, 500);
        assert_eq!(err.to_string(), "Internal Error (500)");
    }

    #[test]
    fn test_well_known_errors() {
        assert_eq!(RouterError::not_found(), RouterError::new("Not Found", 404));
        assert_eq!(RouterError::circular_redirect().status, 500);
        assert_eq!(RouterError::already_running().message, "Already running");
        assert_eq!(RouterError::cancelled().message, "Cancelled");
    }

    #[test]
    fn test_redirect_default_status() {
        assert_eq!(DynamicRedirect::new("/home").status, 302);
        assert_eq!(DynamicRedirect::with_status("/home", 301).status, 301);
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: Result<&str, RouterError> = Ok("fine");
        assert_eq!(Outcome::from(ok), Outcome::Done(json!("fine")));

        let err: Result<&str, RouterError> = Err(RouterError::new("Access Forbidden", 403));
        assert_eq!(
            Outcome::from(err),
            Outcome::Fail(RouterError::new("Access Forbidden", 403))
        );
    }

    #[test]
    fn test_failure_envelope() {
        let result = RouterResult::failure(
            "/x",
            Location::parse("/x"),
            Context::new(),
            RouterError::not_found(),
        );
        assert!(!result.is_ok());
        assert_eq!(result.status, 404);
        assert!(result.route.is_none());
        assert!(result.result.is_none());
    }

    #[test]
    fn test_error_serializes_as_message_and_status() {
        let value = serde_json::to_value(RouterError::not_found()).unwrap();
        assert_eq!(value, json!({ "message": "Not Found", "status": 404 }));
    }
}
