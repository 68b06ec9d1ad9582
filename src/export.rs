//! Export pipeline
//!
//! Composes schema derivation, projection, marker transformation and a
//! format writer into one run: caller supplies a cursor, declared
//! fields, a destination config and a byte sink; bytes land in the sink
//! and the row count comes back.

use crate::config::DestinationConfig;
use crate::error::Result;
use crate::marker::ChangeMarkerTransformer;
use crate::schema::SchemaBuilder;
use crate::source::{ProjectedSource, RowSource};
use crate::types::{ExportFormat, SourceField};
use crate::writers::{ColumnarWriter, DelimitedWriter, DocumentWriter, FormatWriter};
use std::io::Write;
use tracing::info;

/// Run one export.
///
/// Schema derivation (and with it every projection or rename failure)
/// happens before the first row is pulled, so a misdeclared export
/// writes nothing. One run is sequential against one cursor; retrying
/// after a sink failure is the orchestrator's call, not ours.
pub fn export(
    format: ExportFormat,
    sink: &mut (dyn Write + Send),
    fields: &[SourceField],
    rows: &mut dyn RowSource,
    config: &DestinationConfig,
) -> Result<u64> {
    let schema = SchemaBuilder::new(config).build(fields)?;

    let transformer = config
        .marker
        .clone()
        .map(|marker| ChangeMarkerTransformer::new(marker, config.arrays_native));
    let mut projected = ProjectedSource::new(rows, fields, transformer);

    info!(?format, fields = schema.len(), "export started");
    let count = match format {
        ExportFormat::Delimited => {
            DelimitedWriter::new(config).write(sink, &schema, &mut projected)
        }
        ExportFormat::Document => DocumentWriter::new(config).write(sink, &schema, &mut projected),
        ExportFormat::Columnar => ColumnarWriter::new(config).write(sink, &schema, &mut projected),
    }?;
    info!(?format, rows = count, "export finished");

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldOrderPolicy;
    use crate::error::Error;
    use crate::marker::{MarkerConfig, MarkerDialect};
    use crate::source::VecSource;
    use crate::types::{Row, SourceType, Value};
    use pretty_assertions::assert_eq;

    fn cdc_fields() -> Vec<SourceField> {
        vec![
            SourceField::new("__ChangeType__", SourceType::Text),
            SourceField::new("id", SourceType::Int64),
        ]
    }

    fn cdc_rows() -> Vec<Row> {
        vec![
            Row::from_pairs([
                ("__ChangeType__", Value::Text("Added".to_string())),
                ("id", Value::Int64(1)),
            ]),
            Row::from_pairs([
                ("__ChangeType__", Value::Text("Removed".to_string())),
                ("id", Value::Int64(2)),
            ]),
        ]
    }

    #[test]
    fn test_cdc_delimited_export() {
        let config = DestinationConfig::new()
            .with_field_order(FieldOrderPolicy::MarkerLast)
            .with_marker(MarkerConfig::new(
                "__ChangeType__",
                "__rowMarker__",
                MarkerDialect::Lakehouse,
            ));
        let mut rows = VecSource::new(cdc_rows());
        let mut buf: Vec<u8> = Vec::new();

        let count = export(
            ExportFormat::Delimited,
            &mut buf,
            &cdc_fields(),
            &mut rows,
            &config,
        )
        .unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["id,__rowMarker__", "1,3", "2,2"]);
    }

    #[test]
    fn test_unsupported_field_writes_nothing() {
        let fields = vec![SourceField::new(
            "shape",
            SourceType::Complex("Geometry".to_string()),
        )];
        let config = DestinationConfig::default();
        let mut rows = VecSource::new(vec![]);
        let mut buf: Vec<u8> = Vec::new();

        let err = export(
            ExportFormat::Columnar,
            &mut buf,
            &fields,
            &mut rows,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { .. }));
        assert!(buf.is_empty());
    }
}
