//! Per-transition key/value store.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Shared, set-once store handed to hooks and actions.
///
/// The first `set` for a key wins; later sets for the same key are ignored.
/// Clones share the same storage, so the caller sees every value written
/// during the transition.
#[derive(Debug, Clone, Default)]
pub struct Context {
    keys: Arc<DashMap<String, Value>>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key` unless the key is already set.
    ///
    /// Returns true if the value was stored.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        match self.keys.entry(key.into()) {
            Entry::Occupied(entry) => {
                tracing::trace!(key = %entry.key(), "Context key already set, ignoring");
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(value.into());
                true
            }
        }
    }

    /// Get a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.keys.get(key).map(|r| r.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Copy every entry into an ordered map.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.keys
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}
