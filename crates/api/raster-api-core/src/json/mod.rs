use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use crate::Value;

/// Errors produced while reading or writing value JSON.
#[derive(Debug, Error)]
pub enum JsonError {
    #[error("value json parse error: {0}")]
    Parse(String),
    #[error("serialize value: {0}")]
    Serialize(String),
    #[error("value of kind {0:?} cannot be persisted")]
    Transient(crate::ValueKind),
}

/// Normalize shorthand `Value` JSON into the canonical `{ "type": ..., "data": ... }`
/// representation understood by the serde derives on [`Value`]. This helper accepts
/// both shorthand objects such as `{ "vec3": [1, 2, 3] }` and primitive aliases
/// like `1.0` or `[0, 1, 0]`.
pub fn normalize_value_json(value: JsonValue) -> JsonValue {
    match value {
        // bare numbers are floats even without a fraction; ints must be tagged
        JsonValue::Number(n) => json!({ "type": "float", "data": n }),
        JsonValue::Bool(b) => json!({ "type": "bool", "data": b }),
        JsonValue::String(s) => json!({ "type": "text", "data": s }),
        JsonValue::Array(arr) if arr.iter().all(|x| x.is_number()) => match arr.len() {
            2 => json!({ "type": "vec2", "data": arr }),
            3 => json!({ "type": "vec3", "data": arr }),
            4 => json!({ "type": "vec4", "data": arr }),
            _ => JsonValue::Array(arr),
        },
        JsonValue::Object(obj) => {
            if obj.contains_key("type") && obj.contains_key("data") {
                return JsonValue::Object(obj);
            }
            for alias in ["float", "int", "bool", "text", "vec2", "vec3", "vec4"] {
                if let Some(data) = obj.get(alias) {
                    return json!({ "type": alias, "data": data });
                }
            }
            if let Some(color) = obj.get("color") {
                return json!({ "type": "vec4", "data": color });
            }
            if let Some(transform) = obj.get("transform2d") {
                return json!({ "type": "transform2d", "data": transform });
            }
            if let Some(shape) = obj.get("shape") {
                return json!({ "type": "shape", "data": shape });
            }
            if let Some(sampler) = obj.get("sampler") {
                return json!({ "type": "sampler", "data": sampler });
            }
            JsonValue::Object(obj)
        }
        other => other,
    }
}

/// Normalize then deserialize into the strongly typed [`Value`] enum.
pub fn parse_value(value: JsonValue) -> Result<Value, JsonError> {
    let normalized = normalize_value_json(value);
    serde_json::from_value(normalized).map_err(|e| JsonError::Parse(e.to_string()))
}

/// `deserialize_with` adapter so document fields accept the same shorthand as [`parse_value`].
pub fn deserialize_value<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;
    use serde::Deserialize as _;

    let raw = JsonValue::deserialize(deserializer)?;
    parse_value(raw).map_err(D::Error::custom)
}

/// Parse a JSON string holding a single value.
pub fn parse_value_str(json_str: &str) -> Result<Value, JsonError> {
    let root: JsonValue =
        serde_json::from_str(json_str).map_err(|e| JsonError::Parse(e.to_string()))?;
    parse_value(root)
}

/// Canonical JSON for a persisted value. Pending uploads are runtime-only and refuse to
/// serialize.
pub fn value_to_json(value: &Value) -> Result<JsonValue, JsonError> {
    if let Value::Pending(_) = value {
        return Err(JsonError::Transient(value.kind()));
    }
    serde_json::to_value(value).map_err(|e| JsonError::Serialize(e.to_string()))
}

/// Shorthand JSON (`{ "vec2": [...] }`) for the simple kinds, canonical form otherwise.
pub fn value_to_shorthand_json(value: &Value) -> Result<JsonValue, JsonError> {
    Ok(match value {
        Value::Float(f) => json!({ "float": *f }),
        Value::Int(i) => json!({ "int": *i }),
        Value::Bool(b) => json!({ "bool": *b }),
        Value::Vec2(a) => json!({ "vec2": a }),
        Value::Vec3(a) => json!({ "vec3": a }),
        Value::Vec4(a) => json!({ "vec4": a }),
        Value::Text(s) => json!({ "text": s }),
        other => value_to_json(other)?,
    })
}
