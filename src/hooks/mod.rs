//! Cross-cutting lifecycle hooks.
//!
//! # Data Flow
//! ```text
//! Transition
//!     → start hooks   (path, location, ctx)
//!     → match hooks   (+ route, status, params, redirect)
//!     → action
//!     → resolve hooks (+ result)
//!
//! Any failure (match, action, hook):
//!     → error hooks (observe only)
//!     → failure envelope
//!
//! Router::cancel:
//!     → cancel hooks (not gated by cancellation)
//! ```
//!
//! # Design Decisions
//! - Hook sets run in list order within a phase
//! - A hook returning `Err` stops its phase and routes through error hooks
//! - Nothing runs once the owning transition is cancelled
//! - Disabled pipelines are a no-op (`Router::resolve`)

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::location::Location;
use crate::routing::matcher::Params;
use crate::routing::route::Route;
use crate::transition::{Context, RouterError, RouterResult, Transition};

/// Pipeline checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Start,
    Match,
    Resolve,
    Error,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Match => "match",
            Phase::Resolve => "resolve",
            Phase::Error => "error",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a hook sees. Fields are filled in as the transition progresses.
#[derive(Debug, Clone)]
pub struct HookOptions {
    pub phase: Phase,
    pub path: String,
    pub location: Location,
    pub route: Option<Arc<Route>>,
    pub status: Option<u16>,
    pub params: Option<Params>,
    pub redirect: Option<String>,
    pub result: Option<Value>,
    pub ctx: Context,
    pub error: Option<RouterError>,
}

impl HookOptions {
    pub fn new(phase: Phase, path: impl Into<String>, location: Location, ctx: Context) -> Self {
        Self {
            phase,
            path: path.into(),
            location,
            route: None,
            status: None,
            params: None,
            redirect: None,
            result: None,
            ctx,
            error: None,
        }
    }

    /// Record a failure: stores the error and adopts its status.
    pub fn fail(&mut self, error: RouterError) {
        self.status = Some(error.status);
        self.error = Some(error);
    }

    /// Convert into the outward envelope.
    pub fn into_result(self) -> RouterResult {
        match self.error {
            Some(error) => RouterResult::failure(self.path, self.location, self.ctx, error),
            None => RouterResult {
                path: self.path,
                location: self.location,
                route: self.route,
                status: self.status.unwrap_or(200),
                params: self.params,
                redirect: self.redirect,
                result: self.result,
                ctx: self.ctx,
                error: None,
            },
        }
    }
}

/// A set of lifecycle handlers. Every method defaults to a no-op.
#[async_trait]
pub trait Hooks: Send + Sync {
    async fn on_start(&self, _options: &HookOptions) -> Result<(), RouterError> {
        Ok(())
    }

    async fn on_match(&self, _options: &HookOptions) -> Result<(), RouterError> {
        Ok(())
    }

    async fn on_resolve(&self, _options: &HookOptions) -> Result<(), RouterError> {
        Ok(())
    }

    /// Observes failures; cannot short-circuit.
    async fn on_error(&self, _options: &HookOptions) {}

    /// Fired once per `Router::cancel` call.
    fn on_cancel(&self) {}
}

/// The ordered list of hook sets.
#[derive(Clone, Default)]
pub struct HookPipeline {
    hooks: Vec<Arc<dyn Hooks>>,
}

impl HookPipeline {
    pub fn new(hooks: Vec<Arc<dyn Hooks>>) -> Self {
        Self { hooks }
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run one phase.
    ///
    /// Returns `None` to continue, or the failure envelope if a hook
    /// short-circuited.
    pub async fn run(
        &self,
        phase: Phase,
        transition: Option<&Transition>,
        options: &mut HookOptions,
        enabled: bool,
    ) -> Option<RouterResult> {
        if !enabled {
            return None;
        }
        options.phase = phase;

        for hooks in &self.hooks {
            if transition.is_some_and(Transition::is_cancelled) {
                break;
            }
            let outcome = match phase {
                Phase::Start => hooks.on_start(options).await,
                Phase::Match => hooks.on_match(options).await,
                Phase::Resolve => hooks.on_resolve(options).await,
                Phase::Error => {
                    hooks.on_error(options).await;
                    Ok(())
                }
            };
            if let Err(error) = outcome {
                tracing::debug!(phase = %phase, error = %error, "Hook short-circuited transition");
                options.fail(error);
                return Some(self.handle_error(transition, options.clone(), enabled).await);
            }
        }
        None
    }

    /// Run error hooks (when enabled) and build the failure envelope.
    pub async fn handle_error(
        &self,
        transition: Option<&Transition>,
        mut options: HookOptions,
        enabled: bool,
    ) -> RouterResult {
        if enabled {
            self.notify_error(transition, &mut options).await;
        }
        options.into_result()
    }

    async fn notify_error(&self, transition: Option<&Transition>, options: &mut HookOptions) {
        options.phase = Phase::Error;
        for hooks in &self.hooks {
            if transition.is_some_and(Transition::is_cancelled) {
                break;
            }
            hooks.on_error(options).await;
        }
    }

    /// Invoke every `on_cancel` handler in list order.
    pub fn cancel(&self) {
        for hooks in &self.hooks {
            hooks.on_cancel();
        }
    }
}

impl std::fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookPipeline").field("len", &self.hooks.len()).finish()
    }
}
