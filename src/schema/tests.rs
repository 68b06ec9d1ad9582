//! Tests for schema derivation

use super::*;
use crate::config::{DestinationConfig, FieldOrderPolicy};
use crate::error::Error;
use crate::marker::{MarkerConfig, MarkerDialect};
use crate::types::{FieldType, SourceField, SourceType};
use pretty_assertions::assert_eq;

fn declared_fields() -> Vec<SourceField> {
    vec![
        SourceField::new("__ChangeType__", SourceType::Text),
        SourceField::new("id", SourceType::Int64),
        SourceField::new(
            "name",
            SourceType::Nullable(Box::new(SourceType::Text)),
        ),
    ]
}

fn cdc_config(order: FieldOrderPolicy) -> DestinationConfig {
    DestinationConfig::new()
        .with_field_order(order)
        .with_marker(MarkerConfig::new(
            "__ChangeType__",
            "__rowMarker__",
            MarkerDialect::Lakehouse,
        ))
}

#[test]
fn test_source_order_schema() {
    let config = DestinationConfig::default();
    let schema = SchemaBuilder::new(&config).build(&declared_fields()).unwrap();

    let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["__ChangeType__", "id", "name"]);

    let name_field = schema.field_with_name("name").unwrap();
    assert!(name_field.nullable);
    assert_eq!(name_field.field_type, FieldType::Text);

    let id_field = schema.field_with_name("id").unwrap();
    assert!(!id_field.nullable);
}

#[test]
fn test_marker_renamed_and_forced_last() {
    let config = cdc_config(FieldOrderPolicy::MarkerLast);
    let schema = SchemaBuilder::new(&config).build(&declared_fields()).unwrap();

    let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "__rowMarker__"]);

    let marker = schema.field_with_name("__rowMarker__").unwrap();
    assert_eq!(marker.field_type, FieldType::Text);
    assert!(!marker.nullable);
}

#[test]
fn test_marker_rename_without_reorder() {
    let config = cdc_config(FieldOrderPolicy::SourceOrder);
    let schema = SchemaBuilder::new(&config).build(&declared_fields()).unwrap();

    let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["__rowMarker__", "id", "name"]);
}

#[test]
fn test_rename_collision_is_fatal() {
    let fields = vec![
        SourceField::new("__ChangeType__", SourceType::Text),
        SourceField::new("__rowMarker__", SourceType::Text),
    ];
    let config = cdc_config(FieldOrderPolicy::MarkerLast);
    let err = SchemaBuilder::new(&config).build(&fields).unwrap_err();
    assert!(matches!(err, Error::SchemaCollision { ref name } if name == "__rowMarker__"));
    assert!(err.is_fatal());
}

#[test]
fn test_unsupported_type_rejected_before_rows() {
    let fields = vec![
        SourceField::new("id", SourceType::Int64),
        SourceField::new("shape", SourceType::Complex("Geometry".to_string())),
    ];
    let config = DestinationConfig::default();
    let err = SchemaBuilder::new(&config).build(&fields).unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { type_name } if type_name == "Geometry"));
}

#[test]
fn test_text_array_typed_as_json_without_native_arrays() {
    let fields = vec![
        SourceField::new("__ChangeType__", SourceType::Text),
        SourceField::new("tags", SourceType::Sequence(Box::new(SourceType::Text))),
    ];
    let config = cdc_config(FieldOrderPolicy::SourceOrder).with_arrays_native(false);
    let schema = SchemaBuilder::new(&config).build(&fields).unwrap();
    assert_eq!(
        schema.field_with_name("tags").unwrap().field_type,
        FieldType::Json
    );

    // With native array support the element type is kept.
    let config = cdc_config(FieldOrderPolicy::SourceOrder);
    let schema = SchemaBuilder::new(&config).build(&fields).unwrap();
    assert_eq!(
        schema.field_with_name("tags").unwrap().field_type,
        FieldType::Array(Box::new(FieldType::Text))
    );
}

#[test]
fn test_override_applies_in_schema() {
    let fields = vec![SourceField::new(
        "shape",
        SourceType::Complex("Geometry".to_string()),
    )
    .with_override(FieldType::Text)];
    let config = DestinationConfig::default();
    let schema = SchemaBuilder::new(&config).build(&fields).unwrap();
    assert_eq!(
        schema.field_with_name("shape").unwrap().field_type,
        FieldType::Text
    );
}
