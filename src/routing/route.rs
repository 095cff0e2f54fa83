//! Route tree declaration and compilation.
//!
//! # Responsibilities
//! - Describe the nested route tree (`RawRoute`)
//! - Flatten it once into the ordered compiled table (`Route`)
//! - Concatenate ancestor path segments into the full pattern
//! - Pre-compose every leaf action with its ancestors' middleware
//!
//! # Design Decisions
//! - Depth-first, pre-order walk: table order is declaration order
//! - Only leaves are matchable; groups contribute a path segment and
//!   optionally a middleware
//! - Shape errors are rejected at compile time rather than producing a route
//!   that can never yield a result

use std::future::Future;
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::observability::metrics;
use crate::routing::action::{self, Action, ActionOptions, Chain, Middleware, Next};
use crate::routing::pattern::{Pattern, PatternError};
use crate::transition::Outcome;

/// Errors raised while compiling a route tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
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

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// A node of the declarative route tree.
#[derive(Clone, Default)]
pub struct RawRoute {
    /// Path segment; surrounding slashes are ignored.
    pub path: String,
    /// Leaf handler.
    pub action: Option<Action>,
    /// Group handler wrapping every descendant leaf.
    pub middleware: Option<Middleware>,
    /// Static redirect target.
    pub to: Option<String>,
    /// Status adopted when this route matches.
    pub status: Option<u16>,
    /// Nested routes; `Some` makes this node a group.
    pub childs: Option<Vec<RawRoute>>,
    /// Extra fields copied verbatim onto the compiled route.
    pub meta: Map<String, Value>,
}

impl RawRoute {
    /// Create a node for the given path segment.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// A pathless root grouping `childs`.
    pub fn root(childs: Vec<RawRoute>) -> Self {
        Self {
            childs: Some(childs),
            ..Self::default()
        }
    }

    pub fn action<F, Fut>(self, f: F) -> Self
    where
        F: Fn(ActionOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.with_action(action::action(f))
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn middleware<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Next, ActionOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.with_middleware(action::middleware(f))
    }

    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middleware = Some(middleware);
        self
    }

    /// Make this leaf a static redirect.
    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.to = Some(target.into());
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn childs(mut self, childs: Vec<RawRoute>) -> Self {
        self.childs = Some(childs);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

impl From<Vec<RawRoute>> for RawRoute {
    fn from(childs: Vec<RawRoute>) -> Self {
        RawRoute::root(childs)
    }
}

impl std::fmt::Debug for RawRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawRoute")
            .field("path", &self.path)
            .field("action", &self.action.is_some())
            .field("middleware", &self.middleware.is_some())
            .field("to", &self.to)
            .field("status", &self.status)
            .field("childs", &self.childs)
            .field("meta", &self.meta)
            .finish()
    }
}

/// A matchable leaf of the compiled table.
pub struct Route {
    id: usize,
    pattern: Pattern,
    action: Option<Chain>,
    to: Option<String>,
    status: Option<u16>,
    meta: Map<String, Value>,
}

impl Route {
    /// Position in the compiled table; stable identity for cycle detection.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Full absolute path pattern.
    pub fn path(&self) -> &str {
        self.pattern.template()
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Ordered capture names.
    pub fn keys(&self) -> &[String] {
        self.pattern.keys()
    }

    /// Static redirect target, if this is a redirect leaf.
    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    /// Composed action; `None` for static redirect leaves.
    pub fn action(&self) -> Option<&Chain> {
        self.action.as_ref()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("path", &self.path())
            .field("action", &self.action)
            .field("to", &self.to)
            .field("status", &self.status)
            .field("meta", &self.meta)
            .finish()
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Route", 6)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("path", self.path())?;
        state.serialize_field("keys", self.keys())?;
        state.serialize_field("to", &self.to)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("meta", &self.meta)?;
        state.end()
    }
}

/// Flatten a route tree into the ordered compiled table.
pub fn compile_routes(root: &RawRoute) -> Result<Vec<Arc<Route>>, CompileError> {
    let mut routes = Vec::new();
    let mut ancestors = Vec::new();
    walk(root, &mut ancestors, &mut routes)?;

    tracing::info!(routes = routes.len(), "Route table compiled");
    metrics::record_compiled_routes(routes.len());
    Ok(routes)
}

fn walk<'a>(
    node: &'a RawRoute,
    ancestors: &mut Vec<&'a RawRoute>,
    routes: &mut Vec<Arc<Route>>,
) -> Result<(), CompileError> {
    if let Some(childs) = &node.childs {
        let path = || full_path(ancestors.iter().copied().chain(std::iter::once(node)));
        if childs.is_empty() {
            return Err(CompileError::EmptyGroup { path: path() });
        }
        if node.to.is_some() {
            return Err(CompileError::GroupRedirect { path: path() });
        }
        if node.action.is_some() {
            return Err(CompileError::GroupAction { path: path() });
        }

        ancestors.push(node);
        for child in childs {
            walk(child, ancestors, routes)?;
        }
        ancestors.pop();
        return Ok(());
    }

    let path = full_path(ancestors.iter().copied().chain(std::iter::once(node)));
    if node.middleware.is_some() {
        return Err(CompileError::LeafMiddleware { path });
    }

    let action = match (&node.action, &node.to) {
        (Some(_), Some(_)) => return Err(CompileError::AmbiguousLeaf { path }),
        (None, None) => return Err(CompileError::EmptyLeaf { path }),
        (None, Some(_)) => None,
        (Some(leaf), None) => {
            // Nearest ancestor wraps outermost.
            let layers = ancestors
                .iter()
                .rev()
                .filter_map(|a| a.middleware.clone())
                .collect();
            Some(Chain::new(layers, leaf.clone()))
        }
    };

    let pattern = Pattern::compile(&path)?;
    let route = Route {
        id: routes.len(),
        pattern,
        action,
        to: node.to.clone(),
        status: node.status,
        meta: node.meta.clone(),
    };
    tracing::debug!(id = route.id, path = %route.path(), redirect = ?route.to, "Compiled route");
    routes.push(Arc::new(route));
    Ok(())
}

/// Join non-empty, slash-trimmed segments into an absolute path.
fn full_path<'a>(steps: impl Iterator<Item = &'a RawRoute>) -> String {
    let segments: Vec<&str> = steps
        .map(|step| step.path.trim_matches('/'))
        .filter(|segment| !segment.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}
