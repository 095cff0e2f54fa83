//! Route matching and static redirect resolution.
//!
//! # Responsibilities
//! - Scan the compiled table in declaration order, first match wins
//! - Follow static redirects, detecting cycles
//! - Settle the status code and decode captured params
//!
//! # Design Decisions
//! - Linear scan: order is the only priority rule
//! - Visited set keyed by route id, scoped to one `match_path` call
//! - The first declared status and the first redirect target win across hops
//! - Param decoding is best-effort: undecodable values pass through raw

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use percent_encoding::percent_decode_str;

use crate::location::split_path;
use crate::observability::metrics;
use crate::routing::route::Route;
use crate::transition::RouterError;

/// Decoded captures keyed by capture name.
pub type Params = BTreeMap<String, String>;

/// A successful match.
#[derive(Debug, Clone)]
pub struct Match {
    /// The final, non-redirect route.
    pub route: Arc<Route>,
    pub params: Params,
    pub status: u16,
    /// Target of the first static redirect followed, if any.
    pub redirect: Option<String>,
}

/// The immutable compiled route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    pub fn new(routes: Vec<Arc<Route>>) -> Self {
        Self { routes }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Arc<Route>> {
        self.routes.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    /// First route whose pattern accepts `pathname`, with its raw captures.
    pub fn find(&self, pathname: &str) -> Option<(&Arc<Route>, Vec<Option<String>>)> {
        self.routes
            .iter()
            .find_map(|route| route.pattern().captures(pathname).map(|caps| (route, caps)))
    }

    /// Resolve a path to its final route, following static redirects.
    pub fn match_path(&self, path: &str) -> Result<Match, RouterError> {
        let (mut pathname, _, _) = split_path(path);
        let mut visited = HashSet::new();
        let mut status = None;
        let mut redirect: Option<String> = None;

        loop {
            let Some((route, captures)) = self.find(&pathname) else {
                tracing::debug!(pathname = %pathname, "No route matched");
                return Err(RouterError::not_found());
            };

            if status.is_none() {
                status = route.status();
            }

            let Some(target) = route.to() else {
                let params = route
                    .keys()
                    .iter()
                    .zip(captures)
                    .filter_map(|(key, value)| value.map(|v| (key.clone(), decode_param(&v))))
                    .collect();
                let fallback = if redirect.is_some() { 302 } else { 200 };
                return Ok(Match {
                    route: route.clone(),
                    params,
                    status: status.unwrap_or(fallback),
                    redirect,
                });
            };

            if !visited.insert(route.id()) {
                tracing::debug!(route = %route.path(), "Static redirect cycle detected");
                return Err(RouterError::circular_redirect());
            }

            tracing::debug!(from = %route.path(), to = %target, "Following static redirect");
            metrics::record_redirect("static");
            if redirect.is_none() {
                redirect = Some(target.to_string());
            }
            pathname = split_path(target).0;
        }
    }
}

/// Percent-decode a captured value, keeping it raw if it does not decode.
pub fn decode_param(value: &str) -> String {
    match percent_decode_str(value).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value.to_string(),
    }
}
