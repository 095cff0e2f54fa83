//! Universal path router library.
//!
//! Maps path strings to handler results through a nested route tree,
//! middleware chains, redirects and lifecycle hooks.

pub mod config;
pub mod hooks;
pub mod location;
pub mod observability;
pub mod routing;
pub mod transition;

pub use config::{ActionRegistry, RouterConfig};
pub use hooks::{HookOptions, HookPipeline, Hooks, Phase};
pub use location::{Location, Query};
pub use routing::{ActionOptions, CompileError, Next, Params, RawRoute, Route, Router};
pub use transition::{Context, DynamicRedirect, Outcome, RouterError, RouterResult, Transition, TransitionState};
