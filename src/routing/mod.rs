//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at construction):
//!     RawRoute tree
//!     → route.rs (pre-order walk, full paths, middleware chains)
//!     → pattern.rs (template → matcher + capture names)
//!     → Freeze as immutable RouteTable
//!
//! Navigation:
//!     path
//!     → router.rs (single-flight guard, spawn Transition)
//!     → matcher.rs (first match, static redirects, params)
//!     → action.rs (middleware chain → leaf action)
//! ```
//!
//! # Design Decisions
//! - Routes compiled once, immutable afterwards
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)

pub mod action;
pub mod matcher;
pub mod pattern;
pub mod route;
pub mod router;

pub use action::{action, middleware, Action, ActionOptions, Chain, Middleware, Next};
pub use matcher::{Match, Params, RouteTable};
pub use pattern::{Pattern, PatternError};
pub use route::{compile_routes, CompileError, RawRoute, Route};
pub use router::Router;
