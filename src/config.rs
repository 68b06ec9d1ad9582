//! Destination configuration
//!
//! Recognized destination options, fixed at construction and not
//! renegotiated mid-run.

use crate::marker::MarkerConfig;
use serde::{Deserialize, Serialize};

/// Default row-group capacity for the columnar writer.
///
/// Treated as a tuning default, not a constant; override with
/// [`DestinationConfig::with_row_group_capacity`].
pub const DEFAULT_ROW_GROUP_CAPACITY: usize = 10_000;

/// Default progress-log interval in rows
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000;

/// Field ordering policy applied by the schema builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOrderPolicy {
    /// Keep the caller's declared field order
    #[default]
    SourceOrder,
    /// Force the change-marker field to the end of the schema
    MarkerLast,
}

/// Per-destination export options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Field ordering policy
    pub field_order: FieldOrderPolicy,
    /// Change-marker rename/recode; `None` for non-CDC destinations
    pub marker: Option<MarkerConfig>,
    /// Whether the destination ingests native arrays
    pub arrays_native: bool,
    /// Columnar row-group capacity
    pub row_group_capacity: usize,
    /// Emit a progress log line every this many rows
    pub progress_interval: u64,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            field_order: FieldOrderPolicy::default(),
            marker: None,
            arrays_native: true,
            row_group_capacity: DEFAULT_ROW_GROUP_CAPACITY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl DestinationConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field ordering policy
    #[must_use]
    pub fn with_field_order(mut self, policy: FieldOrderPolicy) -> Self {
        self.field_order = policy;
        self
    }

    /// Enable change-marker transformation for a CDC destination
    #[must_use]
    pub fn with_marker(mut self, marker: MarkerConfig) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Set whether the destination ingests native arrays
    #[must_use]
    pub fn with_arrays_native(mut self, native: bool) -> Self {
        self.arrays_native = native;
        self
    }

    /// Override the columnar row-group capacity
    #[must_use]
    pub fn with_row_group_capacity(mut self, capacity: usize) -> Self {
        self.row_group_capacity = capacity.max(1);
        self
    }

    /// Set the progress-log interval in rows
    #[must_use]
    pub fn with_progress_interval(mut self, rows: u64) -> Self {
        self.progress_interval = rows.max(1);
        self
    }
}
