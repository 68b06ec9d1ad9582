//! Debounced write buffering
//!
//! [`WriteBuffer`] accumulates delivery items until a capacity or
//! idle-timeout trigger fires, then drains them to a caller-supplied
//! delivery action. Storage is pluggable through [`CacheStore`]:
//! in-memory (lost on crash) or DuckDB-backed (survives restart, one
//! round trip per add), multiplexing independent logical batches over
//! one physical store by configuration key.

mod duckdb_store;
mod store;
mod write_buffer;

pub use duckdb_store::{DuckDbStore, FALLBACK_CONNECTION_KEY, PRIMARY_CONNECTION_KEY};
pub use store::{CacheStore, MemoryStore};
pub use write_buffer::{DeliveryFn, WriteBuffer, WriteBufferConfig};

#[cfg(test)]
mod tests;
