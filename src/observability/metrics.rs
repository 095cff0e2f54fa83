//! Metrics collection.
//!
//! # Metrics
//! - `router_transitions_total` (counter): settled transitions by outcome, status, mode
//! - `router_transition_duration_seconds` (histogram): time from start to settle
//! - `router_redirects_total` (counter): redirects followed by kind (static, dynamic)
//! - `router_cancellations_total` (counter): cancelled transitions
//! - `router_rejected_total` (counter): calls refused by the single-flight guard
//! - `router_compiled_routes` (gauge): size of the last compiled table

use std::time::Duration;

use crate::transition::RouterResult;

/// Record a settled transition.
pub fn record_transition(result: &RouterResult, hooks_enabled: bool, elapsed: Duration) {
    let outcome = if result.is_ok() { "success" } else { "failure" };
    let mode = if hooks_enabled { "run" } else { "resolve" };
    metrics::counter!(
        "router_transitions_total",
        "outcome" => outcome,
        "status" => result.status.to_string(),
        "mode" => mode
    )
    .increment(1);
    metrics::histogram!("router_transition_duration_seconds", "mode" => mode)
        .record(elapsed.as_secs_f64());
}

pub fn record_redirect(kind: &'static str) {
    metrics::counter!("router_redirects_total", "kind" => kind).increment(1);
}

pub fn record_cancellation() {
    metrics::counter!("router_cancellations_total").increment(1);
}

pub fn record_rejected() {
    metrics::counter!("router_rejected_total").increment(1);
}

pub fn record_compiled_routes(count: usize) {
    metrics::gauge!("router_compiled_routes").set(count as f64);
}
