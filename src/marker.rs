//! Change-marker transformation for CDC ("mirroring") destinations
//!
//! Mirroring destinations consume ordered row mutations instead of full
//! snapshots and expect the mutation kind in a destination-named marker
//! field carrying a numeric code. This module renames the cursor's
//! change-type field and recodes its value, and folds native text arrays
//! to JSON scalars for destinations that cannot ingest arrays.

use crate::error::{Error, Result};
use crate::types::{ChangeType, Value};
use serde::{Deserialize, Serialize};

/// Marker-recoding dialect.
///
/// Both dialects agree that a delete is `2` but disagree on the code for
/// every other mutation kind. The split exists in deployed destinations,
/// so it is kept as two named dialects rather than unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerDialect {
    /// Delete maps to 2; insert, update and upsert map to 3.
    #[default]
    Lakehouse,
    /// Delete maps to 2; insert, update and upsert map to 4.
    Warehouse,
}

impl MarkerDialect {
    /// Numeric marker code for a mutation kind under this dialect
    pub fn code(&self, change: ChangeType) -> u8 {
        match (self, change) {
            (_, ChangeType::Delete) => 2,
            (MarkerDialect::Lakehouse, _) => 3,
            (MarkerDialect::Warehouse, _) => 4,
        }
    }
}

/// Where the marker field comes from and what the destination calls it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Field name the cursor uses for the mutation kind
    pub source_field: String,
    /// Field name the destination expects
    pub target_field: String,
    /// Recoding dialect
    pub dialect: MarkerDialect,
}

impl MarkerConfig {
    /// Create a marker config
    pub fn new(
        source_field: impl Into<String>,
        target_field: impl Into<String>,
        dialect: MarkerDialect,
    ) -> Self {
        Self {
            source_field: source_field.into(),
            target_field: target_field.into(),
            dialect,
        }
    }
}

/// Default cursor-side change-type field name
pub const DEFAULT_CHANGE_FIELD: &str = "__ChangeType__";

/// Default destination marker field name
pub const DEFAULT_MARKER_FIELD: &str = "__rowMarker__";

impl Default for MarkerConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_CHANGE_FIELD,
            DEFAULT_MARKER_FIELD,
            MarkerDialect::default(),
        )
    }
}

/// Per-field rename/recode pass applied between projection and writing.
#[derive(Debug, Clone)]
pub struct ChangeMarkerTransformer {
    marker: MarkerConfig,
    arrays_native: bool,
}

impl ChangeMarkerTransformer {
    /// Create a transformer for one destination
    pub fn new(marker: MarkerConfig, arrays_native: bool) -> Self {
        Self {
            marker,
            arrays_native,
        }
    }

    /// The destination marker field name
    pub fn target_field(&self) -> &str {
        &self.marker.target_field
    }

    /// True when `name` is the cursor's change-type field
    pub fn is_marker_source(&self, name: &str) -> bool {
        name == self.marker.source_field
    }

    /// Transform one projected field.
    ///
    /// The change-type field is renamed to the destination marker name
    /// and its value recoded to the dialect's numeric code (as text).
    /// Other fields keep their name; a text array folds to a JSON scalar
    /// when the destination cannot ingest native arrays.
    pub fn transform(&self, name: &str, value: Value) -> Result<(String, Value)> {
        if self.is_marker_source(name) {
            let recoded = self.recode(&value)?;
            return Ok((self.marker.target_field.clone(), recoded));
        }
        Ok((name.to_string(), self.fold_array(value)))
    }

    /// Recode a change-type value to its marker code
    fn recode(&self, value: &Value) -> Result<Value> {
        let change = match value {
            Value::Text(text) => ChangeType::parse(text)?,
            other => {
                return Err(Error::InvalidChangeType {
                    value: other.type_name().to_string(),
                })
            }
        };
        Ok(Value::Text(self.marker.dialect.code(change).to_string()))
    }

    /// Fold a text array into one JSON scalar for array-less destinations
    fn fold_array(&self, value: Value) -> Value {
        if self.arrays_native {
            return value;
        }
        match value {
            Value::Array(items) if items.iter().all(is_textual) => {
                let strings: Vec<serde_json::Value> = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Text(text) => serde_json::Value::String(text),
                        Value::Null => serde_json::Value::Null,
                        // unreachable per is_textual, kept total
                        other => serde_json::Value::String(format!("{other:?}")),
                    })
                    .collect();
                Value::Json(serde_json::Value::Array(strings))
            }
            other => other,
        }
    }
}

fn is_textual(value: &Value) -> bool {
    matches!(value, Value::Text(_) | Value::Null)
}
