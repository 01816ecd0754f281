//! Lenient accessors over loosely typed wire records.
//!
//! Push payloads are plain JSON objects whose field types drift between
//! server versions (booleans sent as `0`/`1`, ids sent as strings). Every
//! accessor returns the type's zero value when a field is absent or has an
//! unexpected shape.

use serde_json::{Map, Value};

/// Borrowed view over one JSON object record.
#[derive(Debug, Clone, Copy)]
pub struct WireRecord<'a>(&'a Map<String, Value>);

impl<'a> WireRecord<'a> {
    /// Wraps a JSON object.
    #[must_use]
    pub const fn new(map: &'a Map<String, Value>) -> Self {
        Self(map)
    }

    /// Raw field access.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key)
    }

    /// String field, empty when absent.
    #[must_use]
    pub fn string(&self, key: &str) -> String {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Integer field, `0` when absent. Floats are truncated.
    #[must_use]
    pub fn int(&self, key: &str) -> i64 {
        self.0.get(key).and_then(as_int).unwrap_or(0)
    }

    /// Boolean field that also accepts `0`/`1`.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(other) => as_int(other) == Some(1),
            None => false,
        }
    }

    /// Array of strings; non-string elements are skipped.
    #[must_use]
    pub fn strings(&self, key: &str) -> Vec<String> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Array of ids given as numbers or numeric strings.
    #[must_use]
    pub fn ids(&self, key: &str) -> Vec<i64> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(as_int).collect())
            .unwrap_or_default()
    }

    /// Ids encoded as a set-shaped object: `{"3": true, "5": true}`.
    ///
    /// Keys mapped to `false` are not members. The result is sorted.
    #[must_use]
    pub fn id_set(&self, key: &str) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .0
            .get(key)
            .and_then(Value::as_object)
            .map(|set| {
                set.iter()
                    .filter(|(_, member)| member.as_bool().unwrap_or(true))
                    .filter_map(|(id, _)| id.parse().ok())
                    .collect()
            })
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }
}

/// Reads a number or numeric string as `i64`.
#[allow(clippy::cast_possible_truncation)]
fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
