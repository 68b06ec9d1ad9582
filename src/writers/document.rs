//! Structured-document (JSON) writer

use super::text::value_to_json;
use super::FormatWriter;
use crate::config::DestinationConfig;
use crate::error::Result;
use crate::source::RowSource;
use crate::types::{FieldType, Schema, Value};
use std::io::Write;
use tracing::debug;

/// Streams rows as a single top-level JSON array with one object per
/// row, properties in schema order.
///
/// A text value in a structured (`Json`) field embeds as nested
/// structure when it parses; unparsable text stays a plain string
/// scalar.
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    progress_interval: u64,
}

impl DocumentWriter {
    /// Create a writer from the destination config
    pub fn new(config: &DestinationConfig) -> Self {
        Self {
            progress_interval: config.progress_interval.max(1),
        }
    }

    fn row_object(&self, schema: &Schema, row: &crate::types::Row) -> serde_json::Value {
        let mut object = serde_json::Map::with_capacity(schema.len());
        for field in schema.fields() {
            let value = row.get(&field.name).unwrap_or(&Value::Null);
            let json = match (&field.field_type, value) {
                // Structured text embeds as nested structure when it
                // parses; otherwise it stays a plain scalar.
                (FieldType::Json, Value::Text(text)) => serde_json::from_str(text)
                    .unwrap_or_else(|_| serde_json::Value::String(text.clone())),
                _ => value_to_json(value),
            };
            object.insert(field.name.clone(), json);
        }
        serde_json::Value::Object(object)
    }
}

impl FormatWriter for DocumentWriter {
    fn write(
        &self,
        sink: &mut (dyn Write + Send),
        schema: &Schema,
        rows: &mut dyn RowSource,
    ) -> Result<u64> {
        sink.write_all(b"[")?;

        let mut count: u64 = 0;
        while let Some(row) = rows.next_row()? {
            if count > 0 {
                sink.write_all(b",")?;
            }
            let object = self.row_object(schema, &row);
            serde_json::to_writer(&mut *sink, &object)?;

            count += 1;
            if count % self.progress_interval == 0 {
                debug!(rows = count, format = "document", "export progress");
            }
        }

        sink.write_all(b"]")?;
        sink.flush()?;
        Ok(count)
    }
}
