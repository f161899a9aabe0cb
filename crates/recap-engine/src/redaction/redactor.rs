use crate::patterns::{PatternError, PatternLibrary};
use serde_json::{Map, Value};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use tracing::warn;

pub const DEFAULT_MARKER: &str = "<REDACTED>";
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Recursive sanitizer over JSON-like value trees.
///
/// Rules, applied per node:
/// - strings that look like JSON (`{` or `[` after trimming) and parse are
///   replaced by their redacted parsed form; other strings go through the
///   value patterns
/// - in a map, `value` is replaced outright when a sibling `name` or `key`
///   is a sensitive key name, and any string field whose own key is
///   sensitive is replaced outright
/// - everything else is walked or passed through unchanged
///
/// A subtree nested deeper than `max_depth` is replaced by the marker.
#[derive(Debug)]
pub struct Redactor {
    patterns: RwLock<PatternLibrary>,
    marker: String,
    max_depth: usize,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(PatternLibrary::builtin())
    }
}

impl Redactor {
    pub fn new(patterns: PatternLibrary) -> Self {
        Self {
            patterns: RwLock::new(patterns),
            marker: DEFAULT_MARKER.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Adds a value pattern. Only sanitizations that start afterwards see it.
    pub fn register_pattern(&self, pattern: &str, group: Option<usize>) -> Result<(), PatternError> {
        self.patterns
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(pattern, group)
    }

    pub fn redact_value(&self, value: &Value) -> Value {
        let patterns = self.read_patterns();
        self.walk(&patterns).value(value, 0)
    }

    pub fn redact_map(&self, map: &Map<String, Value>) -> Map<String, Value> {
        let patterns = self.read_patterns();
        self.walk(&patterns).map(map, 0)
    }

    fn read_patterns(&self) -> RwLockReadGuard<'_, PatternLibrary> {
        self.patterns.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn walk<'a>(&'a self, patterns: &'a PatternLibrary) -> Walk<'a> {
        Walk {
            patterns,
            marker: &self.marker,
            max_depth: self.max_depth,
        }
    }
}

struct Walk<'a> {
    patterns: &'a PatternLibrary,
    marker: &'a str,
    max_depth: usize,
}

impl Walk<'_> {
    fn value(&self, value: &Value, depth: usize) -> Value {
        if depth > self.max_depth {
            warn!(
                depth,
                max_depth = self.max_depth,
                "Redaction depth limit reached; subtree replaced by marker"
            );
            return Value::String(self.marker.to_string());
        }

        match value {
            Value::String(text) => self.string(text, depth),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.value(item, depth + 1)).collect())
            }
            Value::Object(map) => Value::Object(self.map(map, depth)),
            Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
        }
    }

    fn string(&self, text: &str, depth: usize) -> Value {
        let trimmed = text.trim_start();
        if (trimmed.starts_with('{') || trimmed.starts_with('['))
            && let Ok(parsed) = serde_json::from_str::<Value>(text)
        {
            return self.value(&parsed, depth + 1);
        }
        Value::String(self.patterns.redact_text(text, self.marker))
    }

    fn map(&self, map: &Map<String, Value>, depth: usize) -> Map<String, Value> {
        let labelled_sensitive = self.has_sensitive_label(map);
        map.iter()
            .map(|(key, value)| {
                let redacted = if key == "value" && labelled_sensitive && !value.is_null() {
                    Value::String(self.marker.to_string())
                } else if value.is_string() && self.patterns.is_sensitive_key(key) {
                    Value::String(self.marker.to_string())
                } else {
                    self.value(value, depth + 1)
                };
                (key.clone(), redacted)
            })
            .collect()
    }

    /// `{name, value}` header pairs and `{key, value}` storage pairs.
    fn has_sensitive_label(&self, map: &Map<String, Value>) -> bool {
        ["name", "key"].iter().any(|label| {
            map.get(*label)
                .and_then(Value::as_str)
                .is_some_and(|label| self.patterns.is_sensitive_key(label))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_string_is_expanded() {
        let redactor = Redactor::default();
        let input = json!(r#"{"apiKey":"sk-aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"}"#);
        assert_eq!(
            redactor.redact_value(&input),
            json!({ "apiKey": "<REDACTED>" })
        );
    }

    #[test]
    fn test_malformed_json_string_falls_back_to_patterns() {
        let redactor = Redactor::default();
        let input = json!("{not json, mail jane@example.com");
        assert_eq!(
            redactor.redact_value(&input),
            json!("{not json, mail <REDACTED>")
        );
    }

    #[test]
    fn test_name_value_pairs() {
        let redactor = Redactor::default();
        let headers = json!([
            { "name": "Authorization", "value": "Basic dXNlcjpwYXNz" },
            { "name": "Accept", "value": "application/json" },
            { "key": "refreshToken", "value": 12345 },
            { "name": "cvv", "value": "123" }
        ]);
        assert_eq!(
            redactor.redact_value(&headers),
            json!([
                { "name": "Authorization", "value": "<REDACTED>" },
                { "name": "Accept", "value": "application/json" },
                { "key": "refreshToken", "value": "<REDACTED>" },
                { "name": "cvv", "value": "<REDACTED>" }
            ])
        );
    }

    #[test]
    fn test_sensitive_key_only_replaces_strings() {
        let redactor = Redactor::default();
        let input = json!({
            "password": "hunter2",
            "token": { "issued": 3 },
            "username": "jane"
        });
        assert_eq!(
            redactor.redact_value(&input),
            json!({
                "password": "<REDACTED>",
                "token": { "issued": 3 },
                "username": "jane"
            })
        );
    }

    #[test]
    fn test_primitives_pass_through() {
        let redactor = Redactor::default();
        for value in [json!(null), json!(true), json!(4111111111111111u64), json!("")] {
            assert_eq!(redactor.redact_value(&value), value);
        }
    }

    #[test]
    fn test_depth_limit_replaces_subtree() {
        let redactor = Redactor::default().with_max_depth(1);
        let input = json!({ "outer": { "inner": "plain", "deeper": { "x": 1 } }, "ok": "kept" });
        assert_eq!(
            redactor.redact_value(&input),
            json!({ "outer": { "inner": "<REDACTED>", "deeper": "<REDACTED>" }, "ok": "kept" })
        );
    }

    #[test]
    fn test_zero_depth_redacts_everything_below_root() {
        let redactor = Redactor::default().with_max_depth(0);
        let input = json!({ "note": "hello", "count": 3 });
        assert_eq!(
            redactor.redact_value(&input),
            json!({ "note": "<REDACTED>", "count": "<REDACTED>" })
        );
    }

    #[test]
    fn test_custom_marker_and_late_registration() {
        let redactor = Redactor::default().with_marker("***");
        assert_eq!(redactor.redact_value(&json!("ticket T-5521")), json!("ticket T-5521"));

        redactor.register_pattern(r"T-(\d{4})", Some(1)).unwrap();
        assert_eq!(redactor.redact_value(&json!("ticket T-5521")), json!("ticket T-***"));
    }
}
