//! Projection of declared source types and concrete values onto the
//! supported output type set.

use crate::error::{Error, Result};
use crate::types::{FieldType, SourceType, Value};

/// Project a declared source type to its supported output type.
///
/// A field-level override wins outright. Otherwise the declared type is
/// mapped structurally; a `Complex` type anywhere in the declaration is
/// an `UnsupportedType` error, raised before any row is consumed.
pub fn project_type(declared: &SourceType, type_override: Option<&FieldType>) -> Result<FieldType> {
    if let Some(overridden) = type_override {
        return Ok(overridden.clone());
    }

    match declared {
        SourceType::Bool => Ok(FieldType::Bool),
        SourceType::Int8 => Ok(FieldType::Int8),
        SourceType::Int16 => Ok(FieldType::Int16),
        SourceType::Int32 => Ok(FieldType::Int32),
        SourceType::Int64 => Ok(FieldType::Int64),
        SourceType::UInt8 => Ok(FieldType::UInt8),
        SourceType::UInt16 => Ok(FieldType::UInt16),
        SourceType::UInt32 => Ok(FieldType::UInt32),
        SourceType::UInt64 => Ok(FieldType::UInt64),
        SourceType::Float32 => Ok(FieldType::Float32),
        SourceType::Float64 => Ok(FieldType::Float64),
        SourceType::Decimal { precision, scale } => Ok(FieldType::Decimal {
            precision: *precision,
            scale: *scale,
        }),
        SourceType::Timestamp => Ok(FieldType::Timestamp),
        SourceType::Date => Ok(FieldType::Date),
        SourceType::Time => Ok(FieldType::Time),
        SourceType::Duration => Ok(FieldType::Duration),
        SourceType::Binary => Ok(FieldType::Binary),
        SourceType::Text => Ok(FieldType::Text),
        SourceType::Uuid => Ok(FieldType::Uuid),

        // The columnar format cannot carry the offset, so offset
        // timestamps degrade to a round-trip ISO-8601 string.
        SourceType::TimestampTz => Ok(FieldType::Text),

        // Arbitrary-precision integers exceed every fixed-width output
        // type; carried as their decimal string.
        SourceType::BigInt => Ok(FieldType::Text),

        SourceType::Nullable(inner) => project_type(inner, None),

        SourceType::Sequence(inner) => {
            let element = project_type(inner, None)?;
            Ok(FieldType::Array(Box::new(element)))
        }

        SourceType::Opaque(_) => Ok(FieldType::Text),

        SourceType::Enumerated(_) => Ok(FieldType::Json),

        SourceType::Complex(_) => Err(Error::unsupported_type(declared.type_name())),
    }
}

/// Project a concrete value according to its declared type.
///
/// `Null` always projects to `Null`; a null of a nullable supported
/// type is never an error. Primitive values pass through unchanged;
/// degradable types are rewritten; a value that does not fit its
/// declaration fails fast.
pub fn project_value(value: &Value, declared: &SourceType) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match declared {
        SourceType::Nullable(inner) => project_value(value, inner),

        SourceType::TimestampTz => match value {
            Value::TimestampTz(ts) => Ok(Value::Text(ts.to_rfc3339())),
            Value::Text(text) => Ok(Value::Text(text.clone())),
            other => Err(mismatch(other, declared)),
        },

        SourceType::BigInt => match value {
            Value::BigInt(digits) => Ok(Value::Text(digits.clone())),
            Value::Text(text) => Ok(Value::Text(text.clone())),
            other => Err(mismatch(other, declared)),
        },

        SourceType::Opaque(_) => match value {
            Value::Text(text) => Ok(Value::Text(text.clone())),
            other => Err(mismatch(other, declared)),
        },

        SourceType::Enumerated(_) => match value {
            Value::Json(json) => Ok(Value::Json(json.clone())),
            Value::Text(text) => Ok(Value::Json(serde_json::Value::String(text.clone()))),
            other => Err(mismatch(other, declared)),
        },

        SourceType::Sequence(element) => match value {
            Value::Array(items) => {
                let projected = items
                    .iter()
                    .map(|item| project_value(item, element))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Array(projected))
            }
            other => Err(mismatch(other, declared)),
        },

        SourceType::Complex(_) => Err(Error::unsupported_type(declared.type_name())),

        // Primitive supported types pass through once the value variant
        // matches the declaration; anything else fails fast rather than
        // leaking into the writers.
        _ => {
            if primitive_matches(value, declared) {
                Ok(value.clone())
            } else {
                Err(mismatch(value, declared))
            }
        }
    }
}

fn primitive_matches(value: &Value, declared: &SourceType) -> bool {
    matches!(
        (declared, value),
        (SourceType::Bool, Value::Bool(_))
            | (SourceType::Int8, Value::Int8(_))
            | (SourceType::Int16, Value::Int16(_))
            | (SourceType::Int32, Value::Int32(_))
            | (SourceType::Int64, Value::Int64(_))
            | (SourceType::UInt8, Value::UInt8(_))
            | (SourceType::UInt16, Value::UInt16(_))
            | (SourceType::UInt32, Value::UInt32(_))
            | (SourceType::UInt64, Value::UInt64(_))
            | (SourceType::Float32, Value::Float32(_))
            | (SourceType::Float64, Value::Float64(_))
            | (SourceType::Decimal { .. }, Value::Decimal { .. })
            | (SourceType::Timestamp, Value::Timestamp(_))
            | (SourceType::Date, Value::Date(_))
            | (SourceType::Time, Value::Time(_))
            | (SourceType::Duration, Value::Duration(_))
            | (SourceType::Binary, Value::Binary(_))
            | (SourceType::Text, Value::Text(_))
            // A UUID may arrive pre-rendered as its canonical text.
            | (SourceType::Uuid, Value::Uuid(_) | Value::Text(_))
    )
}

/// Project a value, its declared type and an optional override to the
/// (possibly transformed) value and its supported output type.
pub fn project(
    value: &Value,
    declared: &SourceType,
    type_override: Option<&FieldType>,
) -> Result<(Value, FieldType)> {
    let field_type = project_type(declared, type_override)?;
    let projected = project_value(value, declared)?;
    Ok((projected, field_type))
}

fn mismatch(value: &Value, declared: &SourceType) -> Error {
    Error::unsupported_type(format!(
        "{} value for declared type {}",
        value.type_name(),
        declared.type_name()
    ))
}
