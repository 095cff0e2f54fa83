//! Actions, middleware and their composition.
//!
//! # Design Decisions
//! - A leaf action receives the options bundle and yields an `Outcome`
//! - A middleware additionally receives `Next`, the rest of the chain, and
//!   must call `Next::run` to proceed; returning without it stops the chain
//! - The chain is an ordered list walked by index, so no closures are
//!   rebuilt per call
//! - Compiled routes list the nearest ancestor's middleware first, so the
//!   root-most middleware runs innermost, right around the leaf

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::location::Location;
use crate::routing::matcher::Params;
use crate::routing::route::Route;
use crate::transition::{Context, Outcome};

/// Leaf handler.
pub type Action = Arc<dyn Fn(ActionOptions) -> BoxFuture<'static, Outcome> + Send + Sync>;

/// Ancestor handler wrapping everything nested below it.
pub type Middleware = Arc<dyn Fn(Next, ActionOptions) -> BoxFuture<'static, Outcome> + Send + Sync>;

/// Everything an action sees about the current navigation.
#[derive(Debug, Clone)]
pub struct ActionOptions {
    pub path: String,
    pub location: Location,
    pub route: Arc<Route>,
    pub status: u16,
    pub params: Params,
    pub redirect: Option<String>,
    pub ctx: Context,
}

/// Box an async closure into an [`Action`].
pub fn action<F, Fut>(f: F) -> Action
where
    F: Fn(ActionOptions) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    Arc::new(move |options| Box::pin(f(options)))
}

/// Box an async closure into a [`Middleware`].
pub fn middleware<F, Fut>(f: F) -> Middleware
where
    F: Fn(Next, ActionOptions) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    Arc::new(move |next, options| Box::pin(f(next, options)))
}

/// A leaf action pre-composed with its ancestors' middleware.
#[derive(Clone)]
pub struct Chain {
    middlewares: Arc<[Middleware]>,
    action: Action,
}

impl Chain {
    pub fn new(middlewares: Vec<Middleware>, action: Action) -> Self {
        Self {
            middlewares: middlewares.into(),
            action,
        }
    }

    /// Number of middleware layers around the leaf action.
    pub fn depth(&self) -> usize {
        self.middlewares.len()
    }

    /// Invoke the outermost layer.
    pub fn call(&self, options: ActionOptions) -> BoxFuture<'static, Outcome> {
        Next {
            chain: self.clone(),
            index: 0,
        }
        .run(options)
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain").field("depth", &self.depth()).finish()
    }
}

/// The rest of a chain, handed to a middleware.
#[derive(Clone)]
pub struct Next {
    chain: Chain,
    index: usize,
}

impl Next {
    /// Continue with the next middleware, or the leaf action once every
    /// layer has been entered.
    pub fn run(self, options: ActionOptions) -> BoxFuture<'static, Outcome> {
        match self.chain.middlewares.get(self.index).cloned() {
            Some(layer) => {
                let next = Next {
                    chain: self.chain,
                    index: self.index + 1,
                };
                layer(next, options)
            }
            None => (self.chain.action)(options),
        }
    }
}
