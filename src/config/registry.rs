//! Named handlers for declarative manifests.

use std::collections::HashMap;
use std::future::Future;

use serde_json::json;

use crate::config::loader::ConfigError;
use crate::config::schema::RouteConfig;
use crate::config::validation::join_path;
use crate::routing::{action, middleware, Action, ActionOptions, Middleware, Next, RawRoute};
use crate::transition::Outcome;

/// Maps handler names used in a manifest to actions and middleware.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Action>,
    middleware: HashMap<String, Middleware>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in handlers:
    /// - `echo` action: returns what was matched
    /// - `trace` middleware: logs entry and exit around the rest of the chain
    pub fn builtin() -> Self {
        Self::new()
            .with_action("echo", |options: ActionOptions| async move {
                Outcome::done(json!({
                    "path": options.path,
                    "route": options.route.path(),
                    "params": options.params,
                    "query": options.location.query,
                    "redirect": options.redirect,
                    "meta": options.route.meta(),
                }))
            })
            .with_middleware("trace", |next: Next, options: ActionOptions| async move {
                let route = options.route.path().to_string();
                tracing::debug!(route = %route, "Entering middleware chain");
                let outcome = next.run(options).await;
                tracing::debug!(route = %route, outcome = ?outcome, "Leaving middleware chain");
                outcome
            })
    }

    pub fn with_action<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(ActionOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.actions.insert(name.into(), action(f));
        self
    }

    pub fn with_middleware<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Next, ActionOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.middleware.insert(name.into(), middleware(f));
        self
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn middleware(&self, name: &str) -> Option<&Middleware> {
        self.middleware.get(name)
    }

    /// Bind every handler name in `routes` and build the route tree root.
    pub fn build(&self, routes: &[RouteConfig]) -> Result<RawRoute, ConfigError> {
        let childs = routes
            .iter()
            .map(|route| self.build_node(route, ""))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RawRoute::root(childs))
    }

    fn build_node(&self, node: &RouteConfig, parent: &str) -> Result<RawRoute, ConfigError> {
        let path = join_path(parent, &node.path);
        let mut raw = RawRoute::new(node.path.clone());
        raw.to = node.to.clone();
        raw.status = node.status;
        raw.meta = node.meta.clone();

        if let Some(name) = &node.action {
            let action = self.action(name).ok_or_else(|| ConfigError::UnknownAction {
                name: name.clone(),
                path: path.clone(),
            })?;
            raw = raw.with_action(action.clone());
        }

        if let Some(name) = &node.middleware {
            let middleware = self.middleware(name).ok_or_else(|| ConfigError::UnknownMiddleware {
                name: name.clone(),
                path: path.clone(),
            })?;
            raw = raw.with_middleware(middleware.clone());
        }

        if let Some(childs) = &node.childs {
            let childs = childs
                .iter()
                .map(|child| self.build_node(child, &path))
                .collect::<Result<Vec<_>, _>>()?;
            raw = raw.childs(childs);
        }

        Ok(raw)
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut actions: Vec<&String> = self.actions.keys().collect();
        let mut middleware: Vec<&String> = self.middleware.keys().collect();
        actions.sort();
        middleware.sort();
        f.debug_struct("ActionRegistry")
            .field("actions", &actions)
            .field("middleware", &middleware)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::routing::Router;

    #[test]
    fn test_builtin_names() {
        let registry = ActionRegistry::builtin();
        assert!(registry.action("echo").is_some());
        assert!(registry.middleware("trace").is_some());
        assert!(registry.action("trace").is_none());
    }

    #[test]
    fn test_unknown_action() {
        let config = parse_config(
            r#"
[[routes]]
path = "/api"
middleware = "trace"

[[routes.childs]]
path = "users"
action = "list_users"
"#,
        )
        .unwrap();

        let err = config.build_routes(&ActionRegistry::builtin()).unwrap_err();
        match err {
            ConfigError::UnknownAction { name, path } => {
                assert_eq!(name, "list_users");
                assert_eq!(path, "/api/users");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_manifest_router_echoes_match() {
        let config = parse_config(
            r#"
[[routes]]
path = "/"
middleware = "trace"

[[routes.childs]]
path = "user/:id"
action = "echo"
meta = { section = "users" }

[[routes.childs]]
path = "profile"
to = "/user/me"
"#,
        )
        .unwrap();

        let root = config.build_routes(&ActionRegistry::builtin()).unwrap();
        let router = Router::new(root, Vec::new()).unwrap();

        let result = router.resolve("/profile?tab=posts").await;
        assert!(result.error.is_none());
        assert_eq!(result.status, 302);

        let value = result.result.unwrap();
        assert_eq!(value["route"], "/user/:id");
        assert_eq!(value["params"]["id"], "me");
        assert_eq!(value["query"]["tab"], "posts");
        assert_eq!(value["redirect"], "/user/me");
        assert_eq!(value["meta"]["section"], "users");
    }
}
