//! Durable cache store backed by an embedded DuckDB table.

use super::store::CacheStore;
use crate::error::{Error, Result, ResultExt};
use async_trait::async_trait;
use duckdb::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Primary settings key naming the cache database location
pub const PRIMARY_CONNECTION_KEY: &str = "write_cache_db";

/// Fallback settings key consulted when the primary is absent
pub const FALLBACK_CONNECTION_KEY: &str = "default_connection";

/// Durable [`CacheStore`] over a single-purpose two-column table
/// `write_cache (Data, Configuration)`, created on open if absent.
///
/// Buffered items survive a restart at the cost of one database round
/// trip per add. The `Configuration` column scopes every operation, so
/// independent logical batches multiplex over one physical table.
#[derive(Debug)]
pub struct DuckDbStore {
    conn: Mutex<Connection>,
}

impl DuckDbStore {
    /// Open (or create) the cache database at a path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("opening write cache at {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Open a transient in-memory cache database
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Resolve the database location from a settings map.
    ///
    /// Looks up [`PRIMARY_CONNECTION_KEY`] first, then
    /// [`FALLBACK_CONNECTION_KEY`]; missing both is a configuration
    /// error.
    pub fn from_settings(settings: &HashMap<String, String>) -> Result<Self> {
        let path = settings
            .get(PRIMARY_CONNECTION_KEY)
            .or_else(|| settings.get(FALLBACK_CONNECTION_KEY))
            .ok_or_else(|| {
                Error::config(format!(
                    "no write cache connection under '{PRIMARY_CONNECTION_KEY}' or '{FALLBACK_CONNECTION_KEY}'"
                ))
            })?;
        Self::open(path)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS write_cache (Data TEXT, Configuration TEXT)",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::cache("write cache connection poisoned"))
    }
}

#[async_trait]
impl CacheStore for DuckDbStore {
    async fn append(&self, data: String, config_key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO write_cache (Data, Configuration) VALUES (?, ?)",
            params![data, config_key],
        )?;
        Ok(())
    }

    async fn len(&self, config_key: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM write_cache WHERE Configuration = ?",
            params![config_key],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn drain(&self, config_key: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT Data FROM write_cache WHERE Configuration = ? ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![config_key], |row| row.get::<_, String>(0))?;
        let drained = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        conn.execute(
            "DELETE FROM write_cache WHERE Configuration = ?",
            params![config_key],
        )?;
        Ok(drained)
    }

    async fn clear(&self, config_key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM write_cache WHERE Configuration = ?",
            params![config_key],
        )?;
        Ok(())
    }
}
