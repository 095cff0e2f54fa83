//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! manifest file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all errors at once)
//!     → RouterConfig (validated)
//!     → registry.rs (bind handler names → RawRoute tree)
//!     → Router::new (compile)
//! ```
//!
//! # Design Decisions
//! - Handlers cannot live in a file; the manifest names them and an
//!   `ActionRegistry` supplies the code
//! - All fields have defaults to allow minimal manifests
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod registry;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use registry::ActionRegistry;
pub use schema::{ObservabilityConfig, RouteConfig, RouterConfig};
pub use validation::{validate_config, ValidationError};
