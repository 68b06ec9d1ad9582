//! Schema builder applying destination policy over projected fields.

use crate::config::{DestinationConfig, FieldOrderPolicy};
use crate::error::Result;
use crate::project::project_type;
use crate::types::{Field, FieldType, Schema, SourceField};

/// Derives the output schema for one export run.
///
/// Projection failures and rename collisions surface here, before any
/// row is written.
#[derive(Debug, Clone)]
pub struct SchemaBuilder<'a> {
    config: &'a DestinationConfig,
}

impl<'a> SchemaBuilder<'a> {
    /// Create a builder for one destination
    pub fn new(config: &'a DestinationConfig) -> Self {
        Self { config }
    }

    /// Build the schema from the caller's declared fields.
    pub fn build(&self, fields: &[SourceField]) -> Result<Schema> {
        let mut projected = Vec::with_capacity(fields.len());
        for field in fields {
            projected.push(self.project_field(field)?);
        }

        if self.config.field_order == FieldOrderPolicy::MarkerLast {
            if let Some(marker) = &self.config.marker {
                // Stable partition: everything else keeps source order,
                // the marker field moves to the end.
                let target = marker.target_field.as_str();
                let (rest, markers): (Vec<Field>, Vec<Field>) =
                    projected.into_iter().partition(|f| f.name != target);
                projected = rest;
                projected.extend(markers);
            }
        }

        Schema::new(projected)
    }

    /// Project and (for the marker field) rename one declared field
    fn project_field(&self, field: &SourceField) -> Result<Field> {
        if let Some(marker) = &self.config.marker {
            if field.name == marker.source_field {
                // The marker carries the dialect's numeric code as text.
                return Ok(Field::new(&marker.target_field, FieldType::Text, false));
            }
        }

        let mut field_type = project_type(&field.source_type, field.type_override.as_ref())?;

        // The marker transformer folds text arrays to one JSON scalar
        // for destinations without native array support; the column is
        // typed to match.
        if self.config.marker.is_some()
            && !self.config.arrays_native
            && matches!(&field_type, FieldType::Array(element) if **element == FieldType::Text)
        {
            field_type = FieldType::Json;
        }

        Ok(Field::new(
            &field.name,
            field_type,
            field.source_type.is_nullable(),
        ))
    }
}
