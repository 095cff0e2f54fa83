//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Compiler, matcher, transitions, router produce:
//!     → logging.rs (structured log events, `transition` spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Any tracing subscriber (fmt / JSON installed by init_logging)
//!     → Any metrics recorder the host installs
//! ```
//!
//! # Design Decisions
//! - Transition id (UUID v4) flows through every event of a navigation
//! - Metrics are facade calls: no-ops until a recorder is installed
//! - The library never installs a global subscriber on its own

pub mod logging;
pub mod metrics;
