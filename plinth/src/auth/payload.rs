// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Typed value stored in a session payload. Serialized as plain JSON so the
/// stored form stays readable: `true`, `42`, `1.5`, `"text"`, `{...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Map(BTreeMap<String, SessionValue>),
}

pub type Payload = BTreeMap<String, SessionValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum PayloadError {
    Missing(String),
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    Codec(String),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::Missing(key) => write!(f, "no value stored under '{}'", key),
            PayloadError::TypeMismatch {
                key,
                expected,
                found,
            } => write!(f, "value under '{}' is {}, expected {}", key, found, expected),
            PayloadError::Codec(msg) => write!(f, "payload codec error: {}", msg),
        }
    }
}

impl std::error::Error for PayloadError {}

impl SessionValue {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionValue::Bool(_) => "bool",
            SessionValue::Integer(_) => "integer",
            SessionValue::Float(_) => "float",
            SessionValue::String(_) => "string",
            SessionValue::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SessionValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Integers come back as-is. Floats with no fractional loss beyond truncation
    /// are accepted too, since JSON does not keep the distinction for every writer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SessionValue::Integer(value) => Some(*value),
            SessionValue::Float(value)
                if value.is_finite() && *value >= i64::MIN as f64 && *value <= i64::MAX as f64 =>
            {
                Some(value.trunc() as i64)
            }
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SessionValue::Float(value) => Some(*value),
            SessionValue::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SessionValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, SessionValue>> {
        match self {
            SessionValue::Map(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for SessionValue {
    fn from(value: &str) -> Self {
        SessionValue::String(value.to_string())
    }
}

impl From<String> for SessionValue {
    fn from(value: String) -> Self {
        SessionValue::String(value)
    }
}

impl From<i64> for SessionValue {
    fn from(value: i64) -> Self {
        SessionValue::Integer(value)
    }
}

impl From<i32> for SessionValue {
    fn from(value: i32) -> Self {
        SessionValue::Integer(value.into())
    }
}

impl From<u32> for SessionValue {
    fn from(value: u32) -> Self {
        SessionValue::Integer(value.into())
    }
}

impl From<f64> for SessionValue {
    fn from(value: f64) -> Self {
        SessionValue::Float(value)
    }
}

impl From<bool> for SessionValue {
    fn from(value: bool) -> Self {
        SessionValue::Bool(value)
    }
}

impl<V: Into<SessionValue>> From<BTreeMap<String, V>> for SessionValue {
    fn from(value: BTreeMap<String, V>) -> Self {
        SessionValue::Map(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<V: Into<SessionValue>> From<HashMap<String, V>> for SessionValue {
    fn from(value: HashMap<String, V>) -> Self {
        SessionValue::Map(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// JSON has no encoding for NaN or infinities; serde_json would write `null`,
/// which no [`SessionValue`] reads back.
pub(crate) fn check_storable(key: &str, value: &SessionValue) -> Result<(), PayloadError> {
    match value {
        SessionValue::Float(number) if !number.is_finite() => Err(PayloadError::Codec(format!(
            "value under '{}' is not a finite number",
            key
        ))),
        SessionValue::Map(entries) => entries
            .iter()
            .try_for_each(|(inner, value)| check_storable(inner, value)),
        _ => Ok(()),
    }
}

pub(crate) fn encode_payload(payload: &Payload) -> Result<String, PayloadError> {
    payload
        .iter()
        .try_for_each(|(key, value)| check_storable(key, value))?;
    serde_json::to_string(payload).map_err(|e| PayloadError::Codec(e.to_string()))
}

pub(crate) fn decode_payload(raw: &str) -> Result<Payload, PayloadError> {
    if raw.trim().is_empty() {
        return Ok(Payload::new());
    }
    serde_json::from_str(raw).map_err(|e| PayloadError::Codec(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_json_is_plain() {
        let mut payload = Payload::new();
        payload.insert("count".to_string(), 3.into());
        payload.insert("name".to_string(), "Ada".into());
        payload.insert("ok".to_string(), true.into());

        let raw = encode_payload(&payload).expect("encode");
        assert_eq!(raw, r#"{"count":3,"name":"Ada","ok":true}"#);
    }

    #[test]
    fn integers_and_floats_keep_their_kind() {
        let payload = decode_payload(r#"{"a":7,"b":7.5}"#).expect("decode");
        assert_eq!(payload["a"], SessionValue::Integer(7));
        assert_eq!(payload["b"], SessionValue::Float(7.5));
    }

    #[test]
    fn float_coerces_to_integer_by_truncation() {
        assert_eq!(SessionValue::Float(3.9).as_i64(), Some(3));
        assert_eq!(SessionValue::Float(f64::NAN).as_i64(), None);
        assert_eq!(SessionValue::String("3".into()).as_i64(), None);
    }

    #[test]
    fn nested_maps_decode() {
        let payload = decode_payload(r#"{"profile":{"bio":"hi","age":30}}"#).expect("decode");
        let profile = payload["profile"].as_map().expect("map");
        assert_eq!(profile["bio"].as_str(), Some("hi"));
        assert_eq!(profile["age"].as_i64(), Some(30));
    }

    #[test]
    fn empty_text_decodes_to_empty_payload() {
        assert!(decode_payload("").expect("decode").is_empty());
        assert!(decode_payload("{}").expect("decode").is_empty());
    }

    #[test]
    fn garbage_is_a_codec_error() {
        assert!(matches!(
            decode_payload("not json"),
            Err(PayloadError::Codec(_))
        ));
    }

    #[test]
    fn non_finite_floats_are_refused_before_encoding() {
        let mut payload = Payload::new();
        payload.insert("ratio".to_string(), f64::NAN.into());
        assert!(matches!(
            encode_payload(&payload),
            Err(PayloadError::Codec(_))
        ));

        let mut nested = BTreeMap::new();
        nested.insert("limit".to_string(), SessionValue::Float(f64::INFINITY));
        let mut payload = Payload::new();
        payload.insert("stats".to_string(), nested.into());
        assert!(matches!(
            encode_payload(&payload),
            Err(PayloadError::Codec(msg)) if msg.contains("limit")
        ));

        let mut payload = Payload::new();
        payload.insert("ratio".to_string(), 0.25.into());
        assert_eq!(encode_payload(&payload).expect("encode"), r#"{"ratio":0.25}"#);
    }

    #[test]
    fn hash_map_converts_to_map_value() {
        let mut fields = HashMap::new();
        fields.insert("bio".to_string(), "x");
        let value: SessionValue = fields.into();
        assert_eq!(value.kind(), "map");
    }
}
