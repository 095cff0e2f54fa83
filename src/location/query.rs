//! Query string parsing and serialization.

use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use url::form_urlencoded;

/// Decoded query mapping.
///
/// Single values are strings, repeated keys collect into arrays and a key
/// without `=` maps to `null`.
pub type Query = Map<String, Value>;

/// Parse a query string, with or without its leading `?`.
pub fn parse_query(search: &str) -> Query {
    let mut query = Query::new();
    let trimmed = search.trim_start_matches(['?', '#', '&']);

    for part in trimmed.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = match part.split_once('=') {
            Some((k, v)) => (decode(k), Value::String(decode(v))),
            None => (decode(part), Value::Null),
        };

        match query.get_mut(&key) {
            None => {
                query.insert(key, value);
            }
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }

    query
}

/// Serialize a query mapping, keys sorted, without a leading `?`.
pub fn stringify_query(query: &Query) -> String {
    let mut keys: Vec<&String> = query.keys().collect();
    keys.sort();

    let mut pairs = Vec::new();
    for key in keys {
        match &query[key] {
            Value::Array(values) => {
                for value in values {
                    pairs.push(pair(key, value));
                }
            }
            value => pairs.push(pair(key, value)),
        }
    }
    pairs.join("&")
}

fn pair(key: &str, value: &Value) -> String {
    let key = encode(key);
    match value {
        Value::Null => key,
        Value::String(s) => format!("{}={}", key, encode(s)),
        other => format!("{}={}", key, encode(&other.to_string())),
    }
}

fn encode(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

fn decode(s: &str) -> String {
    let spaced = s.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
