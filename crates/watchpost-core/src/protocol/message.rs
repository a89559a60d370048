//! Untyped message record.
//!
//! Server payloads have no fixed schema beyond a `cmd` field, and the same
//! concept shows up under different keys depending on the sender (`id` vs
//! `incident_id`, `saved_path` vs `url`, or nested inside `payload`). The
//! record stays a plain JSON object at the boundary; consumers pull typed
//! fields out of it with [`Message::pick_str`] and friends.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Sub-keys searched when a candidate key holds a nested object
/// (`payload.event`, `error.message`, ...).
pub const NESTED_KEYS: [&str; 7] = [
    "event",
    "id",
    "incident_id",
    "message",
    "reason",
    "zone",
    "area",
];

/// One JSON object as received from, or sent to, the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(Map<String, Value>);

impl Message {
    /// New message carrying only `cmd`.
    pub fn new(cmd: &str) -> Self {
        let mut map = Map::new();
        map.insert("cmd".to_string(), Value::String(cmd.to_string()));
        Self(map)
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Builder-style field insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Raw `cmd` value (empty when missing or not a string).
    pub fn cmd(&self) -> &str {
        self.0.get("cmd").and_then(Value::as_str).unwrap_or("")
    }

    /// Upper-cased `cmd`, the form every routing comparison uses.
    pub fn command(&self) -> String {
        self.cmd().to_ascii_uppercase()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Boolean field; `None` when absent or not a JSON bool.
    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// String field; `None` when absent or not a JSON string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// First human-readable value among `keys`. See [`pick_str`].
    pub fn pick_str(&self, keys: &[&str]) -> String {
        pick_str(&self.0, keys)
    }

    /// Compact JSON text (no trailing newline).
    pub fn to_compact(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

impl From<Map<String, Value>> for Message {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Return the first present value among `keys`, coerced to a string.
///
/// Strings pass through (even when empty), numbers are formatted, booleans
/// become `"true"`/`"false"`. A nested object is searched recursively for
/// [`NESTED_KEYS`]; if nothing is found there the next candidate key is
/// tried. Returns an empty string when no key matches.
pub fn pick_str(obj: &Map<String, Value>, keys: &[&str]) -> String {
    for key in keys {
        match obj.get(*key) {
            Some(Value::String(s)) => return s.clone(),
            Some(Value::Number(n)) => return format_number(n),
            Some(Value::Bool(b)) => return b.to_string(),
            Some(Value::Object(inner)) => {
                let found = pick_str(inner, &NESTED_KEYS);
                if !found.is_empty() {
                    return found;
                }
            }
            _ => {}
        }
    }
    String::new()
}

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        // integral floats print without a trailing ".0"
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
