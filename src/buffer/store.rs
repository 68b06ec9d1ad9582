//! Cache store contract and the in-memory backing.

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Backing storage for buffered delivery items.
///
/// Items are serialized before they reach the store; every operation is
/// scoped to a configuration key so independent logical batches can
/// share one physical store. Implementations guard their own state;
/// `append` must be safe under concurrent callers, and `drain` must
/// remove exactly what it returns.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Append one serialized item under a configuration key
    async fn append(&self, data: String, config_key: &str) -> Result<()>;

    /// Number of buffered items for a configuration key
    async fn len(&self, config_key: &str) -> Result<usize>;

    /// Remove and return all buffered items for a key, in add order
    async fn drain(&self, config_key: &str) -> Result<Vec<String>>;

    /// Discard all buffered items for a key without returning them
    async fn clear(&self, config_key: &str) -> Result<()>;
}

/// Volatile in-memory store; buffered items are lost on crash.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// (configuration key, serialized item) in add order
    items: Mutex<Vec<(String, String)>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn append(&self, data: String, config_key: &str) -> Result<()> {
        let mut items = self.items.lock().await;
        items.push((config_key.to_string(), data));
        Ok(())
    }

    async fn len(&self, config_key: &str) -> Result<usize> {
        let items = self.items.lock().await;
        Ok(items.iter().filter(|(key, _)| key == config_key).count())
    }

    async fn drain(&self, config_key: &str) -> Result<Vec<String>> {
        let mut items = self.items.lock().await;
        let mut drained = Vec::new();
        let mut kept = Vec::with_capacity(items.len());
        for (key, data) in items.drain(..) {
            if key == config_key {
                drained.push(data);
            } else {
                kept.push((key, data));
            }
        }
        *items = kept;
        Ok(drained)
    }

    async fn clear(&self, config_key: &str) -> Result<()> {
        let mut items = self.items.lock().await;
        items.retain(|(key, _)| key != config_key);
        Ok(())
    }
}
