//! Row cursor seam
//!
//! [`RowSource`] is the contract between the export engine and the
//! external relational client: rows are pulled one at a time until the
//! cursor is exhausted or cancelled. A cursor error propagates and ends
//! the export with the sink left truncated; no repair is attempted.

use crate::error::Result;
use crate::marker::ChangeMarkerTransformer;
use crate::project::project_value;
use crate::types::{Row, SourceField, Value};

/// A cursor-like row producer.
pub trait RowSource {
    /// Pull the next row; `Ok(None)` signals exhaustion.
    fn next_row(&mut self) -> Result<Option<Row>>;
}

/// In-memory row source for tests and small exports.
#[derive(Debug)]
pub struct VecSource {
    rows: std::vec::IntoIter<Row>,
}

impl VecSource {
    /// Create a source over owned rows
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }
}

impl RowSource for VecSource {
    fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.next())
    }
}

/// Adapter applying type projection and marker transformation over an
/// inner cursor, so the format writers stay pure emitters.
///
/// Output rows carry exactly the declared fields, in declaration order,
/// with `Null` for any field the inner row does not provide.
pub struct ProjectedSource<'a> {
    inner: &'a mut dyn RowSource,
    fields: &'a [SourceField],
    marker: Option<ChangeMarkerTransformer>,
}

impl<'a> ProjectedSource<'a> {
    /// Wrap a cursor with projection and an optional marker transform
    pub fn new(
        inner: &'a mut dyn RowSource,
        fields: &'a [SourceField],
        marker: Option<ChangeMarkerTransformer>,
    ) -> Self {
        Self {
            inner,
            fields,
            marker,
        }
    }
}

impl RowSource for ProjectedSource<'_> {
    fn next_row(&mut self) -> Result<Option<Row>> {
        let Some(raw) = self.inner.next_row()? else {
            return Ok(None);
        };

        let mut row = Row::new();
        for field in self.fields {
            let value = raw.get(&field.name).unwrap_or(&Value::Null);
            let projected = project_value(value, &field.source_type)?;
            match &self.marker {
                Some(transformer) => {
                    let (name, value) = transformer.transform(&field.name, projected)?;
                    row.push(name, value);
                }
                None => row.push(&field.name, projected),
            }
        }
        Ok(Some(row))
    }
}
