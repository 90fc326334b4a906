//! JSON interchange.
//!
//! Numbers pass through `serde_json` with arbitrary precision, so decimal
//! literals survive the round trip exactly. Exceptions have no JSON form.

use super::Value;
use crate::error::{JqshError, Result};
use bigdecimal::BigDecimal;
use serde_json::{Map, Number};
use std::str::FromStr;

/// Convert to a `serde_json` value, materializing composites.
pub fn to_json(value: &Value) -> Result<serde_json::Value> {
    Ok(match value {
        Value::Exception(e) => return Err(JqshError::NotSerializable(e.name().to_string())),
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Value::Number(serde_json::from_str::<Number>(&n.to_string())?),
        Value::String(s) => serde_json::Value::String(s.text()),
        Value::Array(a) => serde_json::Value::Array(
            a.items().iter().map(to_json).collect::<Result<Vec<_>>>()?,
        ),
        Value::Object(o) => {
            let mut map = Map::new();
            for (key, item) in o.entries() {
                map.insert(key, to_json(&item)?);
            }
            serde_json::Value::Object(map)
        }
    })
}

pub fn from_json(json: serde_json::Value) -> Result<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            let text = n.to_string();
            let number = BigDecimal::from_str(&text)
                .map_err(|e| JqshError::Internal(format!("bad number {}: {}", text, e)))?;
            Value::Number(number)
        }
        serde_json::Value::String(s) => Value::from(s),
        serde_json::Value::Array(items) => {
            Value::array(items.into_iter().map(from_json).collect::<Result<Vec<_>>>()?)
        }
        serde_json::Value::Object(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (key, item) in map {
                entries.push((key, from_json(item)?));
            }
            Value::object(entries)
        }
    })
}

/// Serialize compactly on one line.
pub fn to_json_string(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(&to_json(value)?)?)
}

/// Parse a stream of whitespace-separated or concatenated JSON values.
pub fn parse_stream(text: &str) -> Result<Vec<Value>> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<serde_json::Value>()
        .map(|item| from_json(item?))
        .collect()
}
