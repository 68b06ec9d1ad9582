//! Delimited-text (CSV) writer

use super::text::value_to_text;
use super::FormatWriter;
use crate::config::DestinationConfig;
use crate::error::Result;
use crate::source::RowSource;
use crate::types::{Schema, Value};
use std::io::Write;
use tracing::debug;

/// Streams rows as CSV: a header record of field names, then one
/// record per row with locale-invariant value formatting.
#[derive(Debug, Clone)]
pub struct DelimitedWriter {
    delimiter: u8,
    progress_interval: u64,
}

impl DelimitedWriter {
    /// Create a writer from the destination config
    pub fn new(config: &DestinationConfig) -> Self {
        Self {
            delimiter: b',',
            progress_interval: config.progress_interval.max(1),
        }
    }

    /// Override the field delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl FormatWriter for DelimitedWriter {
    fn write(
        &self,
        sink: &mut (dyn Write + Send),
        schema: &Schema,
        rows: &mut dyn RowSource,
    ) -> Result<u64> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(sink);

        let header: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        writer.write_record(&header)?;

        let mut count: u64 = 0;
        while let Some(row) = rows.next_row()? {
            let mut record = Vec::with_capacity(schema.len());
            for field in schema.fields() {
                let value = row.get(&field.name).unwrap_or(&Value::Null);
                record.push(value_to_text(value)?);
            }
            writer.write_record(&record)?;

            count += 1;
            if count % self.progress_interval == 0 {
                debug!(rows = count, format = "delimited", "export progress");
            }
        }

        writer.flush()?;
        Ok(count)
    }
}
