//! Key/value fields for structured log calls
//!
//! This module provides:
//! - `Fields`: ordered key/value pairs attached to a structured call
//! - `format_payload`: turns a message plus fields into the JSON object
//!   shipped to the remote sink
//! - `render_payload`: single-line text form written to the local stream

use super::error::{LoggerError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Structured payload: `"message"` plus every field
pub type JsonPayload = Map<String, Value>;

/// Ordered key/value pairs for a structured log call
///
/// Keys are always strings, so a malformed pair cannot reach the payload
/// shaper.
///
/// # Example
///
/// ```
/// use gcplog::Fields;
///
/// let fields = Fields::new()
///     .with("number", 1)
///     .with("string", "bar")
///     .with("slice", vec![1, 2, 3]);
/// assert_eq!(fields.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    pairs: Vec<(String, Value)>,
}

impl Fields {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Add a field
    #[must_use]
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Build fields from an alternating `key, value, key, value, ...` list
    ///
    /// Every even position must hold a string. An unpaired trailing key is
    /// dropped without error.
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::InvalidKey` when a key position holds a
    /// non-string value.
    pub fn from_kv(args: Vec<Value>) -> Result<Self> {
        let mut fields = Fields::new();
        let mut args = args.into_iter().enumerate();

        while let Some((position, key)) = args.next() {
            let key = match key {
                Value::String(key) => key,
                other => return Err(LoggerError::invalid_key(position, other.to_string())),
            };
            match args.next() {
                Some((_, value)) => fields.pairs.push((key, value)),
                None => break,
            }
        }

        Ok(fields)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Fields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Convert any serializable value into a field value
///
/// Values that cannot be represented as JSON become a string describing the
/// failure, so a bad field never aborts a log call.
pub fn field_value<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|e| Value::String(format!("!BADVALUE({})", e)))
}

/// Build the structured payload for a message and its fields
///
/// The result is seeded with `{"message": msg}`; later pairs win on key
/// conflicts, including a field named `"message"`.
pub fn format_payload(msg: &str, fields: &Fields) -> JsonPayload {
    let mut payload = Map::new();
    payload.insert("message".to_string(), Value::String(msg.to_string()));
    for (key, value) in fields.iter() {
        payload.insert(key.to_string(), value.clone());
    }
    payload
}

/// Render a payload as a single-line JSON object with sorted keys
pub fn render_payload(payload: &JsonPayload) -> Result<String> {
    let sorted: BTreeMap<&String, &Value> = payload.iter().collect();
    Ok(serde_json::to_string(&sorted)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_payload_pairs() {
        let fields = Fields::new().with("k1", 1).with("k2", "v2");
        let payload = format_payload("msg", &fields);

        assert_eq!(
            Value::Object(payload),
            json!({"message": "msg", "k1": 1, "k2": "v2"})
        );
    }

    #[test]
    fn test_format_payload_without_fields() {
        let payload = format_payload("just a message", &Fields::new());
        assert_eq!(payload.len(), 1);
        assert_eq!(payload["message"], json!("just a message"));
    }

    #[test]
    fn test_later_field_wins() {
        let fields = Fields::new()
            .with("k", "first")
            .with("k", "second")
            .with("message", "override");
        let payload = format_payload("msg", &fields);

        assert_eq!(payload["k"], json!("second"));
        assert_eq!(payload["message"], json!("override"));
    }

    #[test]
    fn test_from_kv_pairs() {
        let fields = Fields::from_kv(vec![json!("k1"), json!(1), json!("k2"), json!([1, 2])])
            .expect("string keys");
        let payload = format_payload("msg", &fields);

        assert_eq!(
            Value::Object(payload),
            json!({"message": "msg", "k1": 1, "k2": [1, 2]})
        );
    }

    #[test]
    fn test_from_kv_odd_length_drops_trailing_key() {
        let fields = Fields::from_kv(vec![json!("k1")]).expect("no error for unpaired key");
        let payload = format_payload("msg", &fields);

        assert!(!payload.contains_key("k1"));
        assert_eq!(Value::Object(payload), json!({"message": "msg"}));
    }

    #[test]
    fn test_from_kv_rejects_non_string_key() {
        let err = Fields::from_kv(vec![json!("ok"), json!(1), json!(42), json!("v")])
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidKey { position: 2, .. }));
    }

    #[test]
    fn test_field_value_conversions() {
        assert_eq!(field_value(&vec![1, 2, 3]), json!([1, 2, 3]));
        assert_eq!(field_value("bar"), json!("bar"));

        let mut bad_keys = std::collections::HashMap::new();
        bad_keys.insert(vec![1u8], "v");
        let value = field_value(&bad_keys);
        assert!(value.as_str().unwrap().starts_with("!BADVALUE("));
    }

    #[test]
    fn test_render_payload_sorted_single_line() {
        let fields: Fields = [("zeta", json!(1)), ("alpha", json!("a\nb"))].into();
        let rendered = render_payload(&format_payload("m", &fields)).unwrap();

        assert_eq!(rendered, r#"{"alpha":"a\nb","message":"m","zeta":1}"#);
        assert!(!rendered.contains('\n'));
    }
}
