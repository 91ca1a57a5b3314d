use serde_json::{Map, Value};
use std::collections::HashMap;

/// Decode a request body into a JSON object.
///
/// CRM platforms sometimes forward the body as a JSON string that itself holds
/// the object, so one level of string wrapping is unwrapped. Anything that is
/// not an object ends up as an empty map; callers validate required fields.
pub fn decode_body(bytes: &[u8]) -> Map<String, Value> {
    if bytes.is_empty() {
        return Map::new();
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        Ok(_) => Map::new(),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring undecodable request body");
            Map::new()
        }
    }
}

/// Scalar body fields rendered as strings, the same shape a query string has.
/// Nulls, arrays and objects are dropped.
pub fn string_params(body: &Map<String, Value>) -> HashMap<String, String> {
    body.iter()
        .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key.clone(), v)))
        .collect()
}

pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
