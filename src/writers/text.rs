//! Locale-invariant value rendering shared by the writers.

use crate::error::Result;
use crate::types::{format_decimal, format_duration, Value};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Render a value as locale-invariant text for delimited output.
///
/// `Null` renders as the empty field; structured and array values
/// flatten to JSON text.
pub fn value_to_text(value: &Value) -> Result<String> {
    let text = match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int8(v) => v.to_string(),
        Value::Int16(v) => v.to_string(),
        Value::Int32(v) => v.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::UInt8(v) => v.to_string(),
        Value::UInt16(v) => v.to_string(),
        Value::UInt32(v) => v.to_string(),
        Value::UInt64(v) => v.to_string(),
        Value::Float32(v) => v.to_string(),
        Value::Float64(v) => v.to_string(),
        Value::Decimal { unscaled, scale } => format_decimal(*unscaled, *scale),
        Value::BigInt(digits) => digits.clone(),
        Value::Timestamp(ts) => ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        Value::TimestampTz(ts) => ts.to_rfc3339(),
        Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        Value::Time(t) => t.format("%H:%M:%S%.f").to_string(),
        Value::Duration(d) => format_duration(d),
        Value::Binary(bytes) => BASE64.encode(bytes),
        Value::Text(s) => s.clone(),
        Value::Uuid(u) => u.to_string(),
        Value::Json(json) => serde_json::to_string(json)?,
        Value::Array(_) => serde_json::to_string(&value_to_json(value))?,
    };
    Ok(text)
}

/// Render a value as a JSON value for document output.
///
/// Parsed structured values embed natively; types JSON cannot carry
/// (timestamps, decimals, binary) render as their invariant strings.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int8(v) => Json::Number((*v).into()),
        Value::Int16(v) => Json::Number((*v).into()),
        Value::Int32(v) => Json::Number((*v).into()),
        Value::Int64(v) => Json::Number((*v).into()),
        Value::UInt8(v) => Json::Number((*v).into()),
        Value::UInt16(v) => Json::Number((*v).into()),
        Value::UInt32(v) => Json::Number((*v).into()),
        Value::UInt64(v) => {
            // u64 beyond i64 still fits a JSON number
            Json::Number((*v).into())
        }
        Value::Float32(v) => {
            serde_json::Number::from_f64(f64::from(*v)).map_or(Json::Null, Json::Number)
        }
        Value::Float64(v) => serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number),
        Value::Decimal { unscaled, scale } => Json::String(format_decimal(*unscaled, *scale)),
        Value::BigInt(digits) => Json::String(digits.clone()),
        Value::Timestamp(ts) => Json::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        Value::TimestampTz(ts) => Json::String(ts.to_rfc3339()),
        Value::Date(d) => Json::String(d.format("%Y-%m-%d").to_string()),
        Value::Time(t) => Json::String(t.format("%H:%M:%S%.f").to_string()),
        Value::Duration(d) => Json::String(format_duration(d)),
        Value::Binary(bytes) => Json::String(BASE64.encode(bytes)),
        Value::Text(s) => Json::String(s.clone()),
        Value::Uuid(u) => Json::String(u.to_string()),
        Value::Json(json) => json.clone(),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
    }
}
