//! Columnar (Parquet) writer
//!
//! Builds an explicit Arrow schema up front, accumulates rows into a
//! bounded row group and flushes each full group plus the final partial
//! group, so every row reaches the sink exactly once.

use super::FormatWriter;
use crate::config::DestinationConfig;
use crate::error::{Error, Result};
use crate::source::RowSource;
use crate::types::{time_to_micros, FieldType, Row, Schema, Value};
use arrow::array::{
    ArrayRef, BinaryArray, BooleanArray, Date32Array, Decimal128Array, DurationMicrosecondArray,
    Float32Array, Float64Array, Int16Array, Int32Array, Int64Array, Int8Array, ListArray,
    StringArray, Time64MicrosecondArray, TimestampMicrosecondArray, UInt16Array, UInt32Array,
    UInt64Array, UInt8Array,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

/// Streams rows into Parquet with bounded row groups.
///
/// Row-group capacity is a performance knob; correctness only requires
/// that each row reach the sink exactly once. For N rows and capacity C
/// the writer flushes `ceil(N / C)` groups.
#[derive(Debug, Clone)]
pub struct ColumnarWriter {
    row_group_capacity: usize,
    progress_interval: u64,
}

impl ColumnarWriter {
    /// Create a writer from the destination config
    pub fn new(config: &DestinationConfig) -> Self {
        Self {
            row_group_capacity: config.row_group_capacity.max(1),
            progress_interval: config.progress_interval.max(1),
        }
    }
}

impl FormatWriter for ColumnarWriter {
    fn write(
        &self,
        sink: &mut (dyn Write + Send),
        schema: &Schema,
        rows: &mut dyn RowSource,
    ) -> Result<u64> {
        // The typed schema is built before any row is consumed, so an
        // unrepresentable field fails with nothing written to the sink.
        let arrow_schema = Arc::new(to_arrow_schema(schema));

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .set_max_row_group_size(self.row_group_capacity)
            .build();
        let mut writer = ArrowWriter::try_new(sink, Arc::clone(&arrow_schema), Some(props))?;

        let mut group: Vec<Row> = Vec::with_capacity(self.row_group_capacity);
        let mut count: u64 = 0;

        while let Some(row) = rows.next_row()? {
            group.push(row);
            count += 1;

            if count % self.progress_interval == 0 {
                debug!(rows = count, format = "columnar", "export progress");
            }

            if group.len() >= self.row_group_capacity {
                flush_group(&mut writer, schema, &arrow_schema, &mut group)?;
            }
        }

        // Final partial group; nothing may be left behind.
        if !group.is_empty() {
            flush_group(&mut writer, schema, &arrow_schema, &mut group)?;
        }

        writer.close()?;
        Ok(count)
    }
}

fn flush_group<W: Write + Send>(
    writer: &mut ArrowWriter<W>,
    schema: &Schema,
    arrow_schema: &Arc<ArrowSchema>,
    group: &mut Vec<Row>,
) -> Result<()> {
    let batch = rows_to_batch(schema, arrow_schema, group)?;
    writer.write(&batch)?;
    // One row group per batch
    writer.flush()?;
    group.clear();
    Ok(())
}

/// Map the output schema onto an Arrow schema
pub fn to_arrow_schema(schema: &Schema) -> ArrowSchema {
    let fields: Vec<ArrowField> = schema
        .fields()
        .iter()
        .map(|f| ArrowField::new(&f.name, to_arrow_dtype(&f.field_type), f.nullable))
        .collect();
    ArrowSchema::new(fields)
}

fn to_arrow_dtype(field_type: &FieldType) -> DataType {
    match field_type {
        FieldType::Bool => DataType::Boolean,
        FieldType::Int8 => DataType::Int8,
        FieldType::Int16 => DataType::Int16,
        FieldType::Int32 => DataType::Int32,
        FieldType::Int64 => DataType::Int64,
        FieldType::UInt8 => DataType::UInt8,
        FieldType::UInt16 => DataType::UInt16,
        FieldType::UInt32 => DataType::UInt32,
        FieldType::UInt64 => DataType::UInt64,
        FieldType::Float32 => DataType::Float32,
        FieldType::Float64 => DataType::Float64,
        FieldType::Decimal { precision, scale } => DataType::Decimal128(*precision, *scale),
        FieldType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        FieldType::Date => DataType::Date32,
        FieldType::Time => DataType::Time64(TimeUnit::Microsecond),
        FieldType::Duration => DataType::Duration(TimeUnit::Microsecond),
        FieldType::Binary => DataType::Binary,
        FieldType::Text | FieldType::Uuid | FieldType::Json => DataType::Utf8,
        FieldType::Array(element) => DataType::List(Arc::new(ArrowField::new(
            "item",
            to_arrow_dtype(element),
            true,
        ))),
    }
}

/// Convert one row group to a RecordBatch
fn rows_to_batch(
    schema: &Schema,
    arrow_schema: &Arc<ArrowSchema>,
    rows: &[Row],
) -> Result<RecordBatch> {
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.len());
    for field in schema.fields() {
        let values: Vec<&Value> = rows
            .iter()
            .map(|row| row.get(&field.name).unwrap_or(&Value::Null))
            .collect();
        columns.push(build_column(&values, &field.field_type)?);
    }
    RecordBatch::try_new(Arc::clone(arrow_schema), columns).map_err(Error::from)
}

macro_rules! build_primitive {
    ($values:expr, $variant:ident, $array:ty, $label:literal) => {{
        let mut out = Vec::with_capacity($values.len());
        for value in $values {
            out.push(match value {
                Value::Null => None,
                Value::$variant(x) => Some(*x),
                other => return Err(column_mismatch(other, $label)),
            });
        }
        Arc::new(<$array>::from(out)) as ArrayRef
    }};
}

/// Build a typed Arrow array from one column of values
fn build_column(values: &[&Value], field_type: &FieldType) -> Result<ArrayRef> {
    let array: ArrayRef = match field_type {
        FieldType::Bool => build_primitive!(values, Bool, BooleanArray, "Bool"),
        FieldType::Int8 => build_primitive!(values, Int8, Int8Array, "Int8"),
        FieldType::Int16 => build_primitive!(values, Int16, Int16Array, "Int16"),
        FieldType::Int32 => build_primitive!(values, Int32, Int32Array, "Int32"),
        FieldType::Int64 => build_primitive!(values, Int64, Int64Array, "Int64"),
        FieldType::UInt8 => build_primitive!(values, UInt8, UInt8Array, "UInt8"),
        FieldType::UInt16 => build_primitive!(values, UInt16, UInt16Array, "UInt16"),
        FieldType::UInt32 => build_primitive!(values, UInt32, UInt32Array, "UInt32"),
        FieldType::UInt64 => build_primitive!(values, UInt64, UInt64Array, "UInt64"),
        FieldType::Float32 => build_primitive!(values, Float32, Float32Array, "Float32"),
        FieldType::Float64 => build_primitive!(values, Float64, Float64Array, "Float64"),

        FieldType::Decimal { precision, scale } => {
            let mut out = Vec::with_capacity(values.len());
            for value in values {
                out.push(match value {
                    Value::Null => None,
                    Value::Decimal {
                        unscaled,
                        scale: value_scale,
                    } => Some(rescale_decimal(*unscaled, *value_scale, *scale)?),
                    other => return Err(column_mismatch(other, "Decimal")),
                });
            }
            Arc::new(
                Decimal128Array::from(out).with_precision_and_scale(*precision, *scale)?,
            )
        }

        FieldType::Timestamp => {
            let mut out = Vec::with_capacity(values.len());
            for value in values {
                out.push(match value {
                    Value::Null => None,
                    Value::Timestamp(ts) => Some(ts.and_utc().timestamp_micros()),
                    other => return Err(column_mismatch(other, "Timestamp")),
                });
            }
            Arc::new(TimestampMicrosecondArray::from(out))
        }

        FieldType::Date => {
            let epoch = chrono::NaiveDate::default(); // 1970-01-01
            let mut out = Vec::with_capacity(values.len());
            for value in values {
                out.push(match value {
                    Value::Null => None,
                    Value::Date(d) => Some((*d - epoch).num_days() as i32),
                    other => return Err(column_mismatch(other, "Date")),
                });
            }
            Arc::new(Date32Array::from(out))
        }

        FieldType::Time => {
            let mut out = Vec::with_capacity(values.len());
            for value in values {
                out.push(match value {
                    Value::Null => None,
                    Value::Time(t) => Some(time_to_micros(t)),
                    other => return Err(column_mismatch(other, "Time")),
                });
            }
            Arc::new(Time64MicrosecondArray::from(out))
        }

        FieldType::Duration => {
            let mut out = Vec::with_capacity(values.len());
            for value in values {
                out.push(match value {
                    Value::Null => None,
                    Value::Duration(d) => Some(d.num_microseconds().unwrap_or(i64::MAX)),
                    other => return Err(column_mismatch(other, "Duration")),
                });
            }
            Arc::new(DurationMicrosecondArray::from(out))
        }

        FieldType::Binary => {
            let mut out: Vec<Option<&[u8]>> = Vec::with_capacity(values.len());
            for value in values {
                out.push(match value {
                    Value::Null => None,
                    Value::Binary(bytes) => Some(bytes.as_slice()),
                    other => return Err(column_mismatch(other, "Binary")),
                });
            }
            Arc::new(BinaryArray::from_opt_vec(out))
        }

        FieldType::Text => {
            let mut out: Vec<Option<String>> = Vec::with_capacity(values.len());
            for value in values {
                out.push(match value {
                    Value::Null => None,
                    Value::Text(s) => Some(s.clone()),
                    other => return Err(column_mismatch(other, "Text")),
                });
            }
            Arc::new(StringArray::from(out))
        }

        FieldType::Uuid => {
            let mut out: Vec<Option<String>> = Vec::with_capacity(values.len());
            for value in values {
                out.push(match value {
                    Value::Null => None,
                    Value::Uuid(u) => Some(u.to_string()),
                    Value::Text(s) => Some(s.clone()),
                    other => return Err(column_mismatch(other, "Uuid")),
                });
            }
            Arc::new(StringArray::from(out))
        }

        FieldType::Json => {
            let mut out: Vec<Option<String>> = Vec::with_capacity(values.len());
            for value in values {
                out.push(match value {
                    Value::Null => None,
                    Value::Json(json) => Some(serde_json::to_string(json)?),
                    Value::Text(s) => Some(s.clone()),
                    other => return Err(column_mismatch(other, "Json")),
                });
            }
            Arc::new(StringArray::from(out))
        }

        FieldType::Array(element) => build_list_column(values, element)?,
    };
    Ok(array)
}

fn build_list_column(values: &[&Value], element: &FieldType) -> Result<ArrayRef> {
    let mut items: Vec<&Value> = Vec::new();
    let mut offsets: Vec<i32> = vec![0];
    let mut validity: Vec<bool> = Vec::with_capacity(values.len());

    for value in values {
        match value {
            Value::Null => validity.push(false),
            Value::Array(elements) => {
                items.extend(elements.iter());
                validity.push(true);
            }
            other => return Err(column_mismatch(other, "Array")),
        }
        let offset = i32::try_from(items.len())
            .map_err(|_| Error::sink("array column too large for i32 offsets"))?;
        offsets.push(offset);
    }

    let child = build_column(&items, element)?;
    let field = Arc::new(ArrowField::new("item", to_arrow_dtype(element), true));
    let nulls = if validity.iter().all(|set| *set) {
        None
    } else {
        Some(NullBuffer::from(validity))
    };

    Ok(Arc::new(ListArray::new(
        field,
        OffsetBuffer::new(offsets.into()),
        child,
        nulls,
    )))
}

/// Adjust a decimal's unscaled value to the column scale
fn rescale_decimal(unscaled: i128, from_scale: i8, to_scale: i8) -> Result<i128> {
    if from_scale == to_scale {
        return Ok(unscaled);
    }
    if from_scale < to_scale {
        let factor = 10_i128
            .checked_pow(u32::from((to_scale - from_scale) as u8))
            .ok_or_else(|| Error::unsupported_type("Decimal beyond 128-bit range"))?;
        return unscaled
            .checked_mul(factor)
            .ok_or_else(|| Error::unsupported_type("Decimal beyond 128-bit range"));
    }
    // Narrowing the scale loses digits; refuse rather than truncate.
    let factor = 10_i128
        .checked_pow(u32::from((from_scale - to_scale) as u8))
        .ok_or_else(|| Error::unsupported_type("Decimal beyond 128-bit range"))?;
    if unscaled % factor != 0 {
        return Err(Error::unsupported_type(format!(
            "Decimal with scale {from_scale} in a scale-{to_scale} column"
        )));
    }
    Ok(unscaled / factor)
}

fn column_mismatch(value: &Value, column: &str) -> Error {
    Error::unsupported_type(format!("{} value in {column} column", value.type_name()))
}
