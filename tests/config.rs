//! Manifest loading through to navigation.

use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use tempfile::NamedTempFile;

use path_router::config::{load_config, ActionRegistry, ConfigError};
use path_router::observability::logging::TracingHooks;
use path_router::{Hooks, Outcome, Router, RouterError};

const MANIFEST: &str = r#"
[observability]
log_level = "debug"

[[routes]]
path = "/"
middleware = "trace"

[[routes.childs]]
path = "home"
action = "echo"
meta = { title = "Home" }

[[routes.childs]]
path = "old-home"
to = "/home"
status = 301

[[routes]]
path = "/admin"
middleware = "deny"

[[routes.childs]]
path = "panel"
action = "echo"
"#;

fn write_manifest(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn registry() -> ActionRegistry {
    ActionRegistry::builtin().with_middleware("deny", |_next, _options| async {
        Outcome::fail("Access Forbidden", 403)
    })
}

#[tokio::test]
async fn test_manifest_to_router() {
    let manifest = write_manifest(MANIFEST);
    let config = load_config(manifest.path()).unwrap();

    assert_eq!(config.observability.log_level, "debug");
    let root = config.build_routes(&registry()).unwrap();
    let hooks: Vec<Arc<dyn Hooks>> = vec![Arc::new(TracingHooks)];
    let router = Router::new(root, hooks).unwrap();

    let paths: Vec<&str> = router.routes().iter().map(|r| r.path()).collect();
    assert_eq!(paths, vec!["/home", "/old-home", "/admin/panel"]);

    let result = router.run("/old-home?ref=mail").await;
    assert_eq!(result.status, 301);
    assert_eq!(result.redirect.as_deref(), Some("/home"));
    let value = result.result.unwrap();
    assert_eq!(value["meta"]["title"], "Home");
    assert_eq!(value["query"], json!({ "ref": "mail" }));

    let denied = router.run("/admin/panel").await;
    assert_eq!(denied.error, Some(RouterError::new("Access Forbidden", 403)));
}

#[test]
fn test_unknown_middleware_names_route() {
    let manifest = write_manifest(MANIFEST);
    let config = load_config(manifest.path()).unwrap();

    match config.build_routes(&ActionRegistry::builtin()) {
        Err(ConfigError::UnknownMiddleware { name, path }) => {
            assert_eq!(name, "deny");
            assert_eq!(path, "/admin");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_invalid_manifest_rejected() {
    let manifest = write_manifest("[[routes]]\npath = \"/a\"\naction = \"echo\"\nto = \"/b\"\n");
    let err = load_config(manifest.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
}
