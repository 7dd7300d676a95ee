//! Lenient deserializers for admin form payloads.
//!
//! The dashboard submits numbers as strings and arrays as JSON-encoded
//! strings depending on the form widget, so these accept both.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `Option<i64>` from a number, a numeric string, `null` or `""`.
pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => value_to_i64(&v)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected an integer id, got {}", v))),
    }
}

/// `Option<i32>` with the same rules as [`opt_id`].
pub fn opt_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match opt_id(deserializer)? {
        None => Ok(None),
        Some(n) => i32::try_from(n)
            .map(Some)
            .map_err(|_| de::Error::custom(format!("integer out of range: {}", n))),
    }
}

/// `Option<f64>` from a number or a numeric string.
pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a number, got {:?}", s))),
        Some(v) => Err(de::Error::custom(format!("expected a number, got {}", v))),
    }
}

/// Decodes a JSON array given either directly or as a JSON-encoded string.
fn decode_array(value: Value) -> Result<Option<Vec<Value>>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => Ok(Some(items)),
        Value::String(s) if s.trim().is_empty() => Ok(Some(Vec::new())),
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Array(items)) => Ok(Some(items)),
            _ => Err(format!("expected a JSON array, got {:?}", s)),
        },
        other => Err(format!("expected a JSON array, got {}", other)),
    }
}

/// `Option<Vec<i64>>` from an array of ids (numbers or numeric strings) or a
/// JSON-encoded array. `null` means "not provided"; `[]` and `""` mean empty.
pub fn opt_id_list<'de, D>(deserializer: D) -> Result<Option<Vec<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    let Some(items) = decode_array(value).map_err(de::Error::custom)? else {
        return Ok(None);
    };
    items
        .iter()
        .map(|item| {
            value_to_i64(item)
                .ok_or_else(|| de::Error::custom(format!("expected an integer id, got {}", item)))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// `Option<Vec<T>>` from an array or a JSON-encoded array.
pub fn opt_json_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    let Some(items) = decode_array(value).map_err(de::Error::custom)? else {
        return Ok(None);
    };
    serde_json::from_value(Value::Array(items))
        .map(Some)
        .map_err(de::Error::custom)
}
