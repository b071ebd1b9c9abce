//! Decoding of structured values stored as JSON text columns.
//!
//! Blend signatures and per-sample chemical data are persisted as JSON text.
//! A missing or unparseable value must never fail the surrounding read, so
//! decoding yields a [`JsonField`] that keeps the fallback branch visible to
//! the caller instead of swallowing the parse error.

use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum JsonField<T> {
    Decoded(T),
    /// Column was NULL or an empty string.
    Missing,
    /// Column held text that did not decode into `T`.
    Malformed(String),
}

impl<T: DeserializeOwned> JsonField<T> {
    pub fn decode(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => JsonField::Missing,
            Some(text) => match serde_json::from_str(text) {
                Ok(value) => JsonField::Decoded(value),
                Err(err) => JsonField::Malformed(err.to_string()),
            },
        }
    }
}

impl<T> JsonField<T> {
    pub fn decoded(self) -> Option<T> {
        match self {
            JsonField::Decoded(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_decoded(&self) -> Option<&T> {
        match self {
            JsonField::Decoded(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Default> JsonField<T> {
    /// The decoded value, or `T::default()` for the missing and malformed
    /// branches.
    pub fn unwrap_or_empty(self) -> T {
        self.decoded().unwrap_or_default()
    }
}

pub fn encode<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    #[test]
    fn test_decode_valid_object() {
        let field: JsonField<Map<String, Value>> = JsonField::decode(Some(r#"{"acidity": 4.5}"#));
        let map = field.decoded().unwrap();
        assert_eq!(map.get("acidity").and_then(Value::as_f64), Some(4.5));
    }

    #[test]
    fn test_decode_null_and_blank_are_missing() {
        assert_eq!(
            JsonField::<Map<String, Value>>::decode(None),
            JsonField::Missing
        );
        assert_eq!(
            JsonField::<Map<String, Value>>::decode(Some("   ")),
            JsonField::Missing
        );
    }

    #[test]
    fn test_decode_garbage_is_malformed_and_falls_back_to_empty() {
        let field: JsonField<Map<String, Value>> = JsonField::decode(Some("{not json"));
        assert!(matches!(field, JsonField::Malformed(_)));
        assert!(field.unwrap_or_empty().is_empty());
    }
}
