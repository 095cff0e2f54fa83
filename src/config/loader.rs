//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::CompileError;

/// Error type for configuration loading and binding.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("unknown action `{name}` on route `{path}`")]
    UnknownAction { name: String, path: String },

    #[error("unknown middleware `{name}` on route `{path}`")]
    UnknownMiddleware { name: String, path: String },

    #[error(transparent)]
    Compile(#[from] CompileError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RouterConfig, ConfigError> {
    let config: RouterConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::info!(path = ?path, routes = config.routes.len(), "Route manifest loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

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
"#;

    #[test]
    fn test_parse_nested_manifest() {
        let config = parse_config(MANIFEST).unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert!(!config.observability.json_logs);

        let root = &config.routes[0];
        assert_eq!(root.middleware.as_deref(), Some("trace"));
        let childs = root.childs.as_ref().unwrap();
        assert_eq!(childs.len(), 2);
        assert_eq!(childs[0].meta.get("title").and_then(|v| v.as_str()), Some("Home"));
        assert_eq!(childs[1].status, Some(301));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("routes = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_lists_everything() {
        let err = parse_config(
            r#"
[[routes]]
path = "a"

[[routes]]
path = "b"
action = "echo"
status = 42
"#,
        )
        .unwrap_err();

        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("definitely-missing-routes.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.toml");
        fs::write(&path, MANIFEST).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.routes.len(), 1);
    }
}
