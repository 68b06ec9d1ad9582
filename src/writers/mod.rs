//! Format writers
//!
//! Three independent implementations of one contract: stream rows from
//! a cursor into a byte sink in schema order and return the row count.
//!
//! - [`DelimitedWriter`]: header record plus one CSV record per row
//! - [`DocumentWriter`]: single top-level JSON array of row objects
//! - [`ColumnarWriter`]: Parquet with bounded row groups
//!
//! Writers never buffer the whole result set; the columnar variant
//! holds at most one row group. A sink failure propagates uncaught and
//! leaves the sink truncated.

mod columnar;
mod delimited;
mod document;
mod text;

pub use columnar::ColumnarWriter;
pub use delimited::DelimitedWriter;
pub use document::DocumentWriter;
pub use text::{value_to_json, value_to_text};

use crate::error::Result;
use crate::source::RowSource;
use crate::types::Schema;
use std::io::Write;

/// Shared writer contract: `write(sink, schema, rows) -> row count`.
pub trait FormatWriter {
    /// Stream every row from `rows` into `sink`, returning the total
    /// number of rows written.
    fn write(
        &self,
        sink: &mut (dyn Write + Send),
        schema: &Schema,
        rows: &mut dyn RowSource,
    ) -> Result<u64>;
}
