//! Text payload conversion.
//!
//! Inbound values arrive as text. Scalar fields parse it with `FromStr`,
//! structured fields deserialize it as JSON.

use std::borrow::Cow;
use std::fmt::Display;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::PathError;

/// Parse a scalar value from its text form.
pub fn parse_scalar<V>(name: &str, raw: &str) -> Result<V, PathError>
where
    V: FromStr,
    V::Err: Display,
{
    raw.parse::<V>().map_err(|e| PathError::Conversion {
        name: name.to_string(),
        raw: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Deserialize a structured value from encoded text.
pub fn parse_structured<V: DeserializeOwned>(name: &str, raw: &str) -> Result<V, PathError> {
    serde_json::from_str(raw).map_err(|e| PathError::Conversion {
        name: name.to_string(),
        raw: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Serialize any value into a JSON value, `null` if it refuses.
pub fn to_value<V: Serialize + ?Sized>(value: &V) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Text form of a JSON value: strings verbatim, everything else rendered.
///
/// This is the form used when comparing a stored change against the raw
/// text a client just sent.
pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}
