//! Location parsing.
//!
//! # Data Flow
//! ```text
//! raw path ("/news/item?id=1#top")
//!     → Location::parse (split hash, then search)
//!     → query.rs (decode search into a mapping)
//!     → Location { pathname, search, hash, query }
//! ```
//!
//! # Design Decisions
//! - Pure functions, no state
//! - Parsed once per transition; redirects re-parse only the pathname
//! - `search` and `hash` keep their leading `?` / `#`

pub mod query;

use serde::{Deserialize, Serialize};

pub use query::{parse_query, stringify_query, Query};

/// A raw path split into its components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Path part, always starting with `/` for well-formed input.
    pub pathname: String,
    /// Query string including the leading `?`, or empty.
    pub search: String,
    /// Fragment including the leading `#`, or empty.
    pub hash: String,
    /// Decoded query mapping built from `search`.
    pub query: Query,
}

impl Location {
    /// Parse a raw location string (pathname + optional `?query` + optional `#hash`).
    pub fn parse(path: &str) -> Self {
        let (pathname, search, hash) = split_path(path);
        let query = parse_query(&search);
        Self {
            pathname,
            search,
            hash,
            query,
        }
    }
}

/// Split a raw path into `(pathname, search, hash)`.
///
/// The hash is cut first so a `?` inside the fragment never starts a query.
pub fn split_path(path: &str) -> (String, String, String) {
    let mut pathname = if path.is_empty() { "/" } else { path };
    let mut search = "";
    let mut hash = "";

    if let Some(idx) = pathname.find('#') {
        hash = &pathname[idx..];
        pathname = &pathname[..idx];
    }

    if let Some(idx) = pathname.find('?') {
        search = &pathname[idx..];
        pathname = &pathname[..idx];
    }

    (
        pathname.to_string(),
        if search == "?" { String::new() } else { search.to_string() },
        if hash == "#" { String::new() } else { hash.to_string() },
    )
}
