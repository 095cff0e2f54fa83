//! Router entry points and the single-flight guard.
//!
//! # Responsibilities
//! - Own the compiled route table and the hook list
//! - Start transitions (`run` with hooks, `resolve` without)
//! - Allow at most one transition at a time
//! - Cancel the current transition out of band
//!
//! # Design Decisions
//! - Immutable table shared through `Arc`; cloning a `Router` is cheap
//! - Flight state is `Idle | Running`, guarded by a mutex never held across
//!   an await
//! - Each transition runs on its own task; the caller waits on a oneshot
//!   fulfilled by whichever settles first: the transition or `cancel`
//! - A settling transition only releases the slot if it is still current,
//!   so an orphaned transition cannot free a newer one's slot

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::oneshot;

use crate::hooks::{HookOptions, HookPipeline, Hooks, Phase};
use crate::location::Location;
use crate::observability::metrics;
use crate::routing::matcher::{Match, RouteTable};
use crate::routing::route::{compile_routes, CompileError, RawRoute};
use crate::transition::{Context, RouterError, RouterResult, Transition};

enum Flight {
    Idle,
    Running {
        transition: Arc<Transition>,
        completion: oneshot::Sender<RouterResult>,
    },
}

struct RouterInner {
    table: RouteTable,
    hooks: HookPipeline,
    flight: Mutex<Flight>,
}

impl RouterInner {
    fn lock_flight(&self) -> MutexGuard<'_, Flight> {
        self.flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Universal path router.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    /// Compile the route tree and build a router with the given hook sets.
    pub fn new(routes: impl Into<RawRoute>, hooks: Vec<Arc<dyn Hooks>>) -> Result<Self, CompileError> {
        let table = RouteTable::new(compile_routes(&routes.into())?);
        Ok(Self {
            inner: Arc::new(RouterInner {
                table,
                hooks: HookPipeline::new(hooks),
                flight: Mutex::new(Flight::Idle),
            }),
        })
    }

    /// The compiled route table, in declaration order.
    pub fn routes(&self) -> &RouteTable {
        &self.inner.table
    }

    pub fn hooks(&self) -> &HookPipeline {
        &self.inner.hooks
    }

    /// Returns true while a transition holds the single-flight slot.
    pub fn is_running(&self) -> bool {
        matches!(*self.inner.lock_flight(), Flight::Running { .. })
    }

    pub fn current_transition(&self) -> Option<Arc<Transition>> {
        match &*self.inner.lock_flight() {
            Flight::Running { transition, .. } => Some(transition.clone()),
            Flight::Idle => None,
        }
    }

    /// Navigate with hooks enabled.
    pub async fn run(&self, path: &str) -> RouterResult {
        self.navigate(path, Context::new(), true).await
    }

    /// Navigate with hooks enabled, using a pre-seeded context.
    pub async fn run_with_context(&self, path: &str, ctx: Context) -> RouterResult {
        self.navigate(path, ctx, true).await
    }

    /// Navigate without hooks.
    pub async fn resolve(&self, path: &str) -> RouterResult {
        self.navigate(path, Context::new(), false).await
    }

    /// Navigate without hooks, using a pre-seeded context.
    pub async fn resolve_with_context(&self, path: &str, ctx: Context) -> RouterResult {
        self.navigate(path, ctx, false).await
    }

    /// Match a path against the table without running anything.
    pub fn match_path(&self, path: &str) -> Result<Match, RouterError> {
        self.inner.table.match_path(path)
    }

    /// Run one hook phase outside of a transition's own flow.
    pub async fn run_hooks(
        &self,
        phase: Phase,
        transition: Option<&Transition>,
        options: &mut HookOptions,
        enabled: bool,
    ) -> Option<RouterResult> {
        self.inner.hooks.run(phase, transition, options, enabled).await
    }

    /// Cancel the current transition.
    ///
    /// The pending caller immediately receives a `Cancelled` envelope and the
    /// router is free for a new transition. Returns false if nothing was
    /// running.
    pub fn cancel(&self, run_cancel_hooks: bool) -> bool {
        let taken = std::mem::replace(&mut *self.inner.lock_flight(), Flight::Idle);
        let Flight::Running { transition, completion } = taken else {
            tracing::debug!("Nothing to cancel");
            return false;
        };

        transition.cancel();
        if run_cancel_hooks {
            self.inner.hooks.cancel();
        }
        tracing::info!(id = %transition.id(), path = %transition.path(), "Transition cancelled");
        metrics::record_cancellation();

        let _ = completion.send(RouterResult::failure(
            transition.path(),
            Location::parse(transition.path()),
            transition.ctx().clone(),
            RouterError::cancelled(),
        ));
        true
    }

    async fn navigate(&self, path: &str, ctx: Context, hooks_enabled: bool) -> RouterResult {
        let transition = Arc::new(Transition::new(path, ctx.clone(), hooks_enabled));
        let (completion, settled) = oneshot::channel();

        {
            let mut flight = self.inner.lock_flight();
            if let Flight::Running { transition: current, .. } = &*flight {
                tracing::warn!(path, current = %current.id(), "Transition already running");
                metrics::record_rejected();
                return RouterResult::failure(path, Location::parse(path), ctx, RouterError::already_running());
            }
            *flight = Flight::Running {
                transition: transition.clone(),
                completion,
            };
        }

        let started = Instant::now();
        let router = self.clone();
        let running = transition.clone();
        let mut task = tokio::spawn(async move {
            let result = running.execute(&router.inner.table, &router.inner.hooks).await;
            router.settle(&running, result);
        });

        let result = tokio::select! {
            biased;
            received = settled => received.unwrap_or_else(|_| {
                RouterResult::failure(path, Location::parse(path), ctx, RouterError::default())
            }),
            joined = &mut task => {
                self.release(&transition);
                match joined {
                    Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                    _ => RouterResult::failure(path, Location::parse(path), ctx, RouterError::default()),
                }
            }
        };

        metrics::record_transition(&result, hooks_enabled, started.elapsed());
        result
    }

    /// Hand a finished transition's result to its caller if it still owns
    /// the slot; otherwise the result is discarded.
    fn settle(&self, transition: &Arc<Transition>, result: RouterResult) {
        match self.take_if_current(transition) {
            Some(completion) => {
                let _ = completion.send(result);
            }
            None => {
                tracing::debug!(id = %transition.id(), "Discarding result of superseded transition");
            }
        }
    }

    fn release(&self, transition: &Arc<Transition>) {
        self.take_if_current(transition);
    }

    fn take_if_current(&self, transition: &Arc<Transition>) -> Option<oneshot::Sender<RouterResult>> {
        let mut flight = self.inner.lock_flight();
        let is_current = matches!(
            &*flight,
            Flight::Running { transition: current, .. } if Arc::ptr_eq(current, transition)
        );
        if !is_current {
            return None;
        }
        match std::mem::replace(&mut *flight, Flight::Idle) {
            Flight::Running { completion, .. } => Some(completion),
            Flight::Idle => None,
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.inner.table.len())
            .field("hooks", &self.inner.hooks.len())
            .field("running", &self.is_running())
            .finish()
    }
}
