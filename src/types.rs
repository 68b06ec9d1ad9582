//! Core data model for lakesink
//!
//! This module contains the value, row, field and schema types shared by
//! the projection, schema and writer layers.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Values
// ============================================================================

/// A single cell value produced by a row cursor.
///
/// Values are transient: one is produced per field per cursor step and
/// dropped once the row has been written.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    /// Fixed-point decimal as unscaled integer plus scale.
    Decimal { unscaled: i128, scale: i8 },
    /// Arbitrary-precision integer carried as its decimal string.
    BigInt(String),
    /// Timestamp without an offset.
    Timestamp(NaiveDateTime),
    /// Timestamp with an offset; degrades to text on projection.
    TimestampTz(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    Duration(chrono::Duration),
    Binary(Vec<u8>),
    Text(String),
    Uuid(Uuid),
    /// Parsed structured value (JSON).
    Json(serde_json::Value),
    Array(Vec<Value>),
}

impl Value {
    /// Name of the value's concrete variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int8(_) => "Int8",
            Value::Int16(_) => "Int16",
            Value::Int32(_) => "Int32",
            Value::Int64(_) => "Int64",
            Value::UInt8(_) => "UInt8",
            Value::UInt16(_) => "UInt16",
            Value::UInt32(_) => "UInt32",
            Value::UInt64(_) => "UInt64",
            Value::Float32(_) => "Float32",
            Value::Float64(_) => "Float64",
            Value::Decimal { .. } => "Decimal",
            Value::BigInt(_) => "BigInt",
            Value::Timestamp(_) => "Timestamp",
            Value::TimestampTz(_) => "TimestampTz",
            Value::Date(_) => "Date",
            Value::Time(_) => "Time",
            Value::Duration(_) => "Duration",
            Value::Binary(_) => "Binary",
            Value::Text(_) => "Text",
            Value::Uuid(_) => "Uuid",
            Value::Json(_) => "Json",
            Value::Array(_) => "Array",
        }
    }

    /// True when the value is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Format a decimal's unscaled value and scale as locale-invariant text.
///
/// `format_decimal(12345, 2)` yields `"123.45"`; a non-positive scale
/// yields the plain integer digits.
pub fn format_decimal(unscaled: i128, scale: i8) -> String {
    if scale <= 0 {
        return unscaled.to_string();
    }
    let negative = unscaled < 0;
    let digits = unscaled.unsigned_abs().to_string();
    let scale = scale as usize;
    let (int_part, frac_part) = if digits.len() > scale {
        let split = digits.len() - scale;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        ("0".to_string(), format!("{digits:0>scale$}"))
    };
    let sign = if negative { "-" } else { "" };
    format!("{sign}{int_part}.{frac_part}")
}

/// Format a duration as an ISO-8601 time interval (`PT1.500000S`).
pub fn format_duration(duration: &chrono::Duration) -> String {
    let total_micros = duration.num_microseconds().unwrap_or_else(|| {
        // Saturate rather than panic on a duration beyond i64 microseconds.
        if duration.num_seconds() < 0 {
            i64::MIN
        } else {
            i64::MAX
        }
    });
    let sign = if total_micros < 0 { "-" } else { "" };
    let abs = total_micros.unsigned_abs();
    let secs = abs / 1_000_000;
    let micros = abs % 1_000_000;
    if micros == 0 {
        format!("{sign}PT{secs}S")
    } else {
        format!("{sign}PT{secs}.{micros:06}S")
    }
}

/// Microseconds since midnight for a time-of-day value.
pub fn time_to_micros(time: &NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * 1_000_000 + i64::from(time.nanosecond()) / 1_000
}

// ============================================================================
// Rows
// ============================================================================

/// An ordered field-name to value mapping produced per cursor step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a row from ordered (name, value) pairs
    pub fn from_pairs(pairs: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
        Self {
            columns: pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    /// Append a column
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.columns.push((name.into(), value));
    }

    /// Look up a value by field name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Ordered iteration over (name, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Consume the row into its ordered pairs
    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when the row has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ============================================================================
// Output Field Types
// ============================================================================

/// The closed set of output types every destination format can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Decimal { precision: u8, scale: i8 },
    Timestamp,
    Date,
    Time,
    Duration,
    Binary,
    Text,
    Uuid,
    /// Structured text; embedded natively by the document writer,
    /// serialized for the others.
    Json,
    Array(Box<FieldType>),
}

/// A named, typed output field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
}

impl Field {
    /// Create a new field
    pub fn new(name: impl Into<String>, field_type: FieldType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable,
        }
    }
}

/// An ordered field schema. Names are unique; order is significant.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Create a schema, rejecting duplicate field names.
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::schema_collision(&field.name));
            }
        }
        Ok(Self { fields })
    }

    /// Ordered fields
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field_with_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the schema has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============================================================================
// Source Types
// ============================================================================

/// Opaque domain objects a cursor may surface; all project to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpaqueKind {
    PersonReference,
    EntityUri,
    Tag,
    Edge,
    Locale,
    Url,
}

impl OpaqueKind {
    /// Name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            OpaqueKind::PersonReference => "PersonReference",
            OpaqueKind::EntityUri => "EntityUri",
            OpaqueKind::Tag => "Tag",
            OpaqueKind::Edge => "Edge",
            OpaqueKind::Locale => "Locale",
            OpaqueKind::Url => "Url",
        }
    }
}

/// The declared, cursor-side type of a field.
///
/// Sequence and nullable wrappers are part of the declaration, so a
/// sequence of a supported element type is recognized from the declared
/// type rather than sniffed from a concrete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Decimal { precision: u8, scale: i8 },
    BigInt,
    Timestamp,
    /// Timestamp with offset; the columnar format cannot carry the
    /// offset, so this degrades to a round-trip ISO-8601 string.
    TimestampTz,
    Date,
    Time,
    Duration,
    Binary,
    Text,
    Uuid,
    Nullable(Box<SourceType>),
    Sequence(Box<SourceType>),
    Opaque(OpaqueKind),
    /// Enumerated domain object; serializes to structured text.
    Enumerated(String),
    /// Anything the engine cannot represent. Always fails projection.
    Complex(String),
}

impl SourceType {
    /// True when the declared type is a nullable wrapper
    pub fn is_nullable(&self) -> bool {
        matches!(self, SourceType::Nullable(_))
    }

    /// Name used in `UnsupportedType` diagnostics
    pub fn type_name(&self) -> String {
        match self {
            SourceType::Complex(name) | SourceType::Enumerated(name) => name.clone(),
            SourceType::Opaque(kind) => kind.name().to_string(),
            SourceType::Nullable(inner) => format!("Nullable<{}>", inner.type_name()),
            SourceType::Sequence(inner) => format!("Sequence<{}>", inner.type_name()),
            other => format!("{other:?}"),
        }
    }
}

/// A caller-declared export field: name, declared type and an optional
/// output-type override applied before destination policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceField {
    pub name: String,
    pub source_type: SourceType,
    pub type_override: Option<FieldType>,
}

impl SourceField {
    /// Declare a field with no override
    pub fn new(name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            name: name.into(),
            source_type,
            type_override: None,
        }
    }

    /// Set an output-type override
    #[must_use]
    pub fn with_override(mut self, field_type: FieldType) -> Self {
        self.type_override = Some(field_type);
        self
    }
}

// ============================================================================
// Change Types
// ============================================================================

/// The kind of row mutation a CDC cursor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Insert,
    Update,
    Delete,
    Upsert,
}

impl ChangeType {
    /// Parse a cursor-side change type spelling.
    ///
    /// Accepts both the enum names and the participle forms some
    /// cursors emit ("Added", "Modified", "Removed", "Upserted"),
    /// case-insensitive. Unknown spellings are a hard error rather
    /// than a silent insert.
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "insert" | "inserted" | "added" | "add" => Ok(ChangeType::Insert),
            "update" | "updated" | "modified" | "modify" => Ok(ChangeType::Update),
            "delete" | "deleted" | "removed" | "remove" => Ok(ChangeType::Delete),
            "upsert" | "upserted" => Ok(ChangeType::Upsert),
            _ => Err(Error::InvalidChangeType {
                value: value.to_string(),
            }),
        }
    }
}

// ============================================================================
// Export Format
// ============================================================================

/// The container format an export run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Delimited text with a header record (CSV)
    #[default]
    Delimited,
    /// Single top-level JSON array of row objects
    Document,
    /// Columnar Parquet with bounded row groups
    Columnar,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_and_order() {
        let row = Row::from_pairs([
            ("id", Value::Int64(1)),
            ("name", Value::Text("A".to_string())),
        ]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("name"), Some(&Value::Text("A".to_string())));
        assert_eq!(row.get("missing"), None);

        let names: Vec<&str> = row.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let err = Schema::new(vec![
            Field::new("id", FieldType::Int64, false),
            Field::new("id", FieldType::Text, true),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::SchemaCollision { name } if name == "id"));
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(12345, 2), "123.45");
        assert_eq!(format_decimal(-12345, 2), "-123.45");
        assert_eq!(format_decimal(5, 3), "0.005");
        assert_eq!(format_decimal(42, 0), "42");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(&chrono::Duration::seconds(90)), "PT90S");
        assert_eq!(
            format_duration(&chrono::Duration::milliseconds(1500)),
            "PT1.500000S"
        );
        assert_eq!(
            format_duration(&chrono::Duration::milliseconds(-250)),
            "-PT0.250000S"
        );
    }

    #[test]
    fn test_change_type_parse() {
        assert_eq!(ChangeType::parse("Added").unwrap(), ChangeType::Insert);
        assert_eq!(ChangeType::parse("modified").unwrap(), ChangeType::Update);
        assert_eq!(ChangeType::parse("Removed").unwrap(), ChangeType::Delete);
        assert_eq!(ChangeType::parse("UPSERT").unwrap(), ChangeType::Upsert);
        assert!(ChangeType::parse("exploded").is_err());
    }

    #[test]
    fn test_source_type_names() {
        assert_eq!(
            SourceType::Complex("GraphNode".to_string()).type_name(),
            "GraphNode"
        );
        assert_eq!(
            SourceType::Nullable(Box::new(SourceType::Int32)).type_name(),
            "Nullable<Int32>"
        );
        assert_eq!(
            SourceType::Sequence(Box::new(SourceType::Opaque(OpaqueKind::Tag))).type_name(),
            "Sequence<Tag>"
        );
    }
}
