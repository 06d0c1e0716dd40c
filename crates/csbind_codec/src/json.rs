//! JSON conversion for record values.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use chrono::SecondsFormat;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

impl Value {
    /// Converts a JSON document into a value.
    ///
    /// JSON has no date/time type, so timestamps arrive as text. Whole
    /// numbers become integers and every other number becomes a float.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::IntegerOutOfRange`] for whole numbers above
    /// `i64::MAX`.
    pub fn from_json(json: serde_json::Value) -> CodecResult<Self> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if n.is_u64() {
                    return Err(CodecError::IntegerOutOfRange);
                } else {
                    Value::Float(n.as_f64().ok_or(CodecError::IntegerOutOfRange)?)
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::from_json)
                    .collect::<CodecResult<_>>()?,
            ),
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| Value::from_json(v).map(|v| (k, v)))
                    .collect::<CodecResult<_>>()?,
            ),
        })
    }

    /// Renders this value as JSON.
    ///
    /// Date/time values become RFC 3339 text. Callbacks and non-finite
    /// floats become null.
    pub fn to_json(&self) -> serde_json::Value {
        // Serializing a Value into serde_json::Value cannot fail: every
        // variant maps onto a JSON type and all map keys are strings.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Callback(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Text(s) => serializer.serialize_str(s),
            Value::DateTime(t) => {
                serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn from_json_object() {
        let value = Value::from_json(json!({
            "content": "chat1",
            "author": "author1",
            "likes": 3,
            "tags": ["a", null, true]
        }))
        .unwrap();

        assert_eq!(value.get("content"), Some(&Value::from("chat1")));
        assert_eq!(value.get("likes"), Some(&Value::Integer(3)));
        assert_eq!(
            value.get("tags"),
            Some(&Value::Array(vec![
                Value::from("a"),
                Value::Null,
                Value::Bool(true)
            ]))
        );
    }

    #[test]
    fn from_json_keeps_fractions() {
        let value = Value::from_json(json!({"content": "a", "price": 1.5})).unwrap();
        assert_eq!(value.get("price"), Some(&Value::Float(1.5)));
        assert_eq!(value.to_json(), json!({"content": "a", "price": 1.5}));
    }

    #[test]
    fn from_json_rejects_integers_past_i64() {
        assert_eq!(
            Value::from_json(json!(u64::MAX)),
            Err(CodecError::IntegerOutOfRange)
        );
    }

    #[test]
    fn to_json_renders_dates_as_text() {
        let value = Value::record([(
            "date",
            Value::from(Utc.with_ymd_and_hms(2014, 11, 1, 0, 0, 0).unwrap()),
        )]);
        assert_eq!(value.to_json(), json!({"date": "2014-11-01T00:00:00Z"}));
    }
}
