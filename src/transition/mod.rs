//! One in-flight navigation.
//!
//! # Data Flow
//! ```text
//! path
//!     → start hooks
//!     → RouteTable::match_path (static redirects resolved here)
//!     → match hooks
//!     → composed action (skipped once cancelled)
//!     → Outcome::Redirect → loop with the new path
//!     → Outcome::Fail     → error hooks → failure envelope
//!     → Outcome::Done     → resolve hooks → success envelope
//! ```
//!
//! # States
//! ```text
//! Pending → Running → Completed
//!     │        │
//!     └────────┴──→ Cancelled
//! ```
//!
//! # Design Decisions
//! - Cancellation is cooperative: it stops further hooks and the action
//!   call but never aborts an action already awaiting
//! - Dynamic redirect history is keyed by the id of the route that issued
//!   the redirect and lives for one top-level call
//! - The location is parsed once from the original path

pub mod context;
pub mod outcome;

use std::collections::HashSet;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::Instrument;
use uuid::Uuid;

use crate::hooks::{HookOptions, HookPipeline, Phase};
use crate::location::Location;
use crate::observability::metrics;
use crate::routing::action::ActionOptions;
use crate::routing::matcher::RouteTable;

pub use context::Context;
pub use outcome::{DynamicRedirect, Outcome, RouterError, RouterResult};

/// Lifecycle state of a transition.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Pending = 0,
    Running = 1,
    Completed = 2,
    Cancelled = 3,
}

impl From<u8> for TransitionState {
    fn from(val: u8) -> Self {
        match val {
            1 => TransitionState::Running,
            2 => TransitionState::Completed,
            3 => TransitionState::Cancelled,
            _ => TransitionState::Pending,
        }
    }
}

/// A single navigation attempt, from initial path to settled result.
#[derive(Debug)]
pub struct Transition {
    id: Uuid,
    path: String,
    ctx: Context,
    hooks_enabled: bool,
    state: AtomicU8,
}

impl Transition {
    /// Create a pending transition.
    pub fn new(path: impl Into<String>, ctx: Context, hooks_enabled: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            ctx,
            hooks_enabled,
            state: AtomicU8::new(TransitionState::Pending as u8),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The path the transition was started with.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub fn hooks_enabled(&self) -> bool {
        self.hooks_enabled
    }

    pub fn state(&self) -> TransitionState {
        TransitionState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == TransitionState::Cancelled
    }

    /// Flag the transition cancelled.
    ///
    /// Returns true if this call flipped the flag. A completed transition
    /// stays completed.
    pub fn cancel(&self) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            match TransitionState::from(current) {
                TransitionState::Cancelled | TransitionState::Completed => return false,
                _ => {}
            }
            match self.state.compare_exchange_weak(
                current,
                TransitionState::Cancelled as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Drive the transition to its settled envelope.
    pub async fn execute(&self, routes: &RouteTable, hooks: &HookPipeline) -> RouterResult {
        let span = tracing::debug_span!(
            "transition",
            id = %self.id,
            path = %self.path,
            hooks = self.hooks_enabled
        );
        async {
            // A cancel that lands before the task starts keeps its state.
            let _ = self.state.compare_exchange(
                TransitionState::Pending as u8,
                TransitionState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            let result = self.attempt(routes, hooks).await;
            let _ = self.state.compare_exchange(
                TransitionState::Running as u8,
                TransitionState::Completed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            tracing::debug!(status = result.status, ok = result.is_ok(), "Transition settled");
            result
        }
        .instrument(span)
        .await
    }

    async fn attempt(&self, routes: &RouteTable, hooks: &HookPipeline) -> RouterResult {
        let enabled = self.hooks_enabled;
        let location = Location::parse(&self.path);
        let mut path = self.path.clone();
        let mut history = HashSet::new();
        let mut carried: Option<DynamicRedirect> = None;

        loop {
            let mut options = HookOptions::new(Phase::Start, path.clone(), location.clone(), self.ctx.clone());
            if let Some(result) = hooks.run(Phase::Start, Some(self), &mut options, enabled).await {
                return result;
            }

            let matched = match routes.match_path(&path) {
                Ok(matched) => matched,
                Err(error) => {
                    options.fail(error);
                    return hooks.handle_error(Some(self), options, enabled).await;
                }
            };

            let (redirect, status) = match &carried {
                Some(hop) => (Some(hop.path.clone()), hop.status),
                None => (matched.redirect.clone(), matched.status),
            };
            options.route = Some(matched.route.clone());
            options.status = Some(status);
            options.params = Some(matched.params.clone());
            options.redirect = redirect.clone();

            if let Some(result) = hooks.run(Phase::Match, Some(self), &mut options, enabled).await {
                return result;
            }

            let outcome = if self.is_cancelled() {
                tracing::debug!(route = %matched.route.path(), "Cancelled before action, skipping");
                None
            } else {
                match matched.route.action() {
                    Some(chain) => Some(
                        chain
                            .call(ActionOptions {
                                path: path.clone(),
                                location: location.clone(),
                                route: matched.route.clone(),
                                status,
                                params: matched.params.clone(),
                                redirect: redirect.clone(),
                                ctx: self.ctx.clone(),
                            })
                            .await,
                    ),
                    None => {
                        tracing::error!(route = %matched.route.path(), "Matched route has no action");
                        Some(Outcome::Fail(RouterError::default()))
                    }
                }
            };

            let result = match outcome {
                None => serde_json::Value::Null,
                Some(Outcome::Done(value)) => value,
                Some(Outcome::Fail(error)) => {
                    options.fail(error);
                    return hooks.handle_error(Some(self), options, enabled).await;
                }
                Some(Outcome::Redirect(hop)) => {
                    if !history.insert(matched.route.id()) {
                        tracing::debug!(route = %matched.route.path(), "Dynamic redirect cycle detected");
                        options.fail(RouterError::circular_redirect());
                        return hooks.handle_error(Some(self), options, enabled).await;
                    }
                    tracing::debug!(from = %path, to = %hop.path, status = hop.status, "Following dynamic redirect");
                    metrics::record_redirect("dynamic");
                    path = hop.path.clone();
                    carried.get_or_insert(hop);
                    continue;
                }
            };

            options.result = Some(result);
            if let Some(result) = hooks.run(Phase::Resolve, Some(self), &mut options, enabled).await {
                return result;
            }

            return options.into_result();
        }
    }
}
