//! Error types for lakesink
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for lakesink
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Projection / Schema Errors
    // ============================================================================
    #[error("Unsupported type: {type_name}")]
    UnsupportedType { type_name: String },

    #[error("Schema collision: duplicate field name '{name}' after renaming")]
    SchemaCollision { name: String },

    #[error("Unrecognized change type value: '{value}'")]
    InvalidChangeType { value: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ============================================================================
    // Write Path Errors
    // ============================================================================
    #[error("Sink write failed: {message}")]
    Sink { message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Write Buffer Errors
    // ============================================================================
    #[error("Write cache error: {message}")]
    Cache { message: String },

    #[error("Flush delivery failed: {message}")]
    FlushDelivery { message: String },

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    // ============================================================================
    // I/O and Generic Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create an unsupported-type error
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// Create a schema collision error
    pub fn schema_collision(name: impl Into<String>) -> Self {
        Self::SchemaCollision { name: name.into() }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a sink error
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }

    /// Create a write cache error
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Check if this error is fatal for the current export/flush.
    ///
    /// Fatal errors describe the export itself (bad types, bad
    /// configuration) and must not be retried by an orchestrator;
    /// everything else is the orchestrator's retry decision.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedType { .. }
                | Error::SchemaCollision { .. }
                | Error::InvalidChangeType { .. }
                | Error::Config { .. }
        )
    }
}

/// Result type alias for lakesink
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unsupported_type("Graph");
        assert_eq!(err.to_string(), "Unsupported type: Graph");

        let err = Error::schema_collision("__rowMarker__");
        assert_eq!(
            err.to_string(),
            "Schema collision: duplicate field name '__rowMarker__' after renaming"
        );

        let err = Error::config("missing marker field");
        assert_eq!(err.to_string(), "Configuration error: missing marker field");
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::unsupported_type("Graph").is_fatal());
        assert!(Error::schema_collision("x").is_fatal());
        assert!(Error::config("bad").is_fatal());
        assert!(Error::InvalidChangeType {
            value: "Exploded".to_string()
        }
        .is_fatal());

        assert!(!Error::sink("stream closed").is_fatal());
        assert!(!Error::cache("cache gone").is_fatal());
        assert!(!Error::FlushDelivery {
            message: "remote refused".to_string()
        }
        .is_fatal());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
