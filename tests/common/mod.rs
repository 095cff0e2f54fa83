//! Shared route tree and hooks for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use path_router::{DynamicRedirect, HookOptions, Hooks, Outcome, RawRoute, Router, RouterError};

/// Marks every phase it sees in the context; fails the match phase when the
/// caller seeded `error = true`.
pub struct ContextHooks;

#[async_trait]
impl Hooks for ContextHooks {
    async fn on_start(&self, options: &HookOptions) -> Result<(), RouterError> {
        options.ctx.set("startHook", true);
        Ok(())
    }

    async fn on_match(&self, options: &HookOptions) -> Result<(), RouterError> {
        options.ctx.set("matchHook", true);
        if options.ctx.get("error") == Some(json!(true)) {
            return Err(RouterError::new("Hook Error", 500));
        }
        Ok(())
    }

    async fn on_resolve(&self, options: &HookOptions) -> Result<(), RouterError> {
        options.ctx.set("resolveHook", true);
        Ok(())
    }
}

/// Counts error-phase notifications.
#[derive(Default)]
pub struct ErrorCounter {
    errors: AtomicUsize,
}

impl ErrorCounter {
    pub fn count(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Hooks for ErrorCounter {
    async fn on_error(&self, _options: &HookOptions) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

fn guarded(path: &str, outcome: Outcome) -> RawRoute {
    RawRoute::new(path)
        .middleware(move |_next, _options| {
            let outcome = outcome.clone();
            async move { outcome }
        })
        .childs(vec![
            RawRoute::new("child1").action(|_| async { Outcome::done("Yo") }),
            RawRoute::new("child2").action(|_| async { Outcome::done("Hi") }),
        ])
}

fn dynamic(path: &str, target: &'static str) -> RawRoute {
    RawRoute::new(path).action(move |_| async move { Outcome::redirect(target) })
}

/// The reference route tree.
pub fn routes() -> Vec<RawRoute> {
    vec![
        RawRoute::new("/lalala/:param").action(|options| async move {
            let param = options.params.get("param").cloned().unwrap_or_default();
            Outcome::done(format!("lalala/{}{}", param, options.location.search))
        }),
        RawRoute::new("/")
            .middleware(|next, options| next.run(options))
            .childs(vec![
                RawRoute::new("home").action(|_| async { Outcome::done("Home sweet home!") }),
                RawRoute::new("/news")
                    .middleware(|next, options| next.run(options))
                    .childs(vec![
                        RawRoute::new("/").action(|_| async { Outcome::done("/news") }),
                        RawRoute::new("item").action(|_| async { Outcome::done("/news/item") }),
                    ]),
                RawRoute::new("redirect").redirect_to("/home"),
                RawRoute::new("redirect-to-redirect").redirect_to("/redirect"),
                RawRoute::new("redirect1").redirect_to("/redirect2"),
                RawRoute::new("redirect2").redirect_to("/redirect1"),
                RawRoute::new("moved").redirect_to("/home").status(301),
                dynamic("dynamic-redirect", "/home"),
                dynamic("dynamic-redirect-to-redirect", "/dynamic-redirect"),
                dynamic("dynamic-redirect1", "/dynamic-redirect2"),
                dynamic("dynamic-redirect2", "/dynamic-redirect1"),
                RawRoute::new("dynamic-moved")
                    .action(|_| async { Outcome::from(DynamicRedirect::with_status("/home", 301)) }),
                guarded("redirect-middleware", Outcome::redirect("/home")),
                RawRoute::new("error").action(|_| async { Outcome::Fail(RouterError::default()) }),
                guarded("error-middleware", Outcome::fail("Access Forbidden", 403)),
            ]),
    ]
}

/// Router over [`routes`] with [`ContextHooks`] installed.
pub fn router() -> Router {
    let hooks: Vec<Arc<dyn Hooks>> = vec![Arc::new(ContextHooks)];
    Router::new(routes(), hooks).unwrap()
}

/// Router over [`routes`] with [`ContextHooks`] and an [`ErrorCounter`].
pub fn counting_router() -> (Router, Arc<ErrorCounter>) {
    let counter = Arc::new(ErrorCounter::default());
    let hooks: Vec<Arc<dyn Hooks>> = vec![Arc::new(ContextHooks), counter.clone()];
    (Router::new(routes(), hooks).unwrap(), counter)
}
