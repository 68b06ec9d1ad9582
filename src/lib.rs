// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Lakesink
//!
//! A streaming tabular-export engine: rows come off a relational result
//! cursor and land in a byte sink as delimited text, a JSON document or
//! columnar Parquet, ready for delivery to lake and warehouse
//! destinations. CDC ("mirroring") destinations get change-marker
//! renaming and recoding on the way through. A generic write buffer
//! batches arbitrary delivery items behind capacity and idle-timeout
//! triggers.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lakesink::{
//!     export, DestinationConfig, ExportFormat, SourceField, SourceType, VecSource,
//! };
//!
//! let fields = vec![
//!     SourceField::new("id", SourceType::Int64),
//!     SourceField::new("name", SourceType::Nullable(Box::new(SourceType::Text))),
//! ];
//! let mut rows = VecSource::new(load_rows());
//! let mut sink = open_sink();
//!
//! let config = DestinationConfig::default();
//! let count = export(ExportFormat::Columnar, &mut sink, &fields, &mut rows, &config)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │ cursor ─ projection ─ schema policy ─ marker ─ format writer   │
//! │ (RowSource)  (project)  (SchemaBuilder)  (marker)  (writers)   │
//! └────────────────────────────────────────────────────────────────┘
//!                               │
//!            ┌──────────────────┴──────────────────┐
//!            │  Delimited   │  Document  │ Columnar │
//!            │  CSV+header  │  JSON array│ Parquet  │
//!            └─────────────────────────────────────┘
//!
//! WriteBuffer (independent): add → [CacheStore] → capacity/idle flush
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: finish field-level docs before 1.0

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Core data model: values, rows, fields, schemas
pub mod types;

/// Type projection onto the supported output types
pub mod project;

/// Schema derivation with destination policy
pub mod schema;

/// Change-marker transformation for CDC destinations
pub mod marker;

/// Row cursor seam and adapters
pub mod source;

/// Destination configuration
pub mod config;

/// Format writers (delimited, document, columnar)
pub mod writers;

/// Export pipeline entry point
pub mod export;

/// Debounced write buffering over pluggable cache stores
pub mod buffer;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use buffer::{CacheStore, DuckDbStore, MemoryStore, WriteBuffer, WriteBufferConfig};
pub use config::{DestinationConfig, FieldOrderPolicy};
pub use export::export;
pub use marker::{ChangeMarkerTransformer, MarkerConfig, MarkerDialect};
pub use schema::SchemaBuilder;
pub use source::{ProjectedSource, RowSource, VecSource};
pub use writers::{ColumnarWriter, DelimitedWriter, DocumentWriter, FormatWriter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
