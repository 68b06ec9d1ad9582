//! Debounced batch accumulator over a cache store.

use super::store::CacheStore;
use crate::error::{Error, Result};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::warn;

/// Caller-supplied delivery action invoked with a drained batch
pub type DeliveryFn<T> = Arc<dyn Fn(Vec<T>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Write buffer triggers and addressing
#[derive(Debug, Clone)]
pub struct WriteBufferConfig {
    /// Batch size that triggers an immediate flush
    pub capacity: usize,
    /// Flush after this long with no flush of any kind
    pub idle_timeout: Duration,
    /// Configuration key scoping this buffer within the store
    pub config_key: String,
}

impl Default for WriteBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            idle_timeout: Duration::from_secs(5),
            config_key: "default".to_string(),
        }
    }
}

impl WriteBufferConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capacity trigger
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Set the idle-timeout trigger
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the configuration key
    #[must_use]
    pub fn with_config_key(mut self, key: impl Into<String>) -> Self {
        self.config_key = key.into();
        self
    }
}

/// Debounced batch accumulator.
///
/// Items append under the store's exclusive access; reaching capacity
/// flushes immediately, and a spawned idle task flushes after the idle
/// window passes with no flush. Flushes serialize behind one gate:
/// whichever trigger fires first wins and the loser drains an empty
/// batch, a no-op. If the delivery action fails the batch stays drained
/// (at-most-once); callers needing at-least-once make delivery
/// idempotent and durable themselves.
pub struct WriteBuffer<T> {
    store: Arc<dyn CacheStore>,
    config: WriteBufferConfig,
    deliver: DeliveryFn<T>,
    flush_gate: Mutex<()>,
    last_flush: Mutex<Instant>,
    _item: PhantomData<fn(T)>,
}

impl<T> WriteBuffer<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// Create a buffer over a store with a delivery action
    pub fn new(store: Arc<dyn CacheStore>, config: WriteBufferConfig, deliver: DeliveryFn<T>) -> Self {
        Self {
            store,
            config,
            deliver,
            flush_gate: Mutex::new(()),
            last_flush: Mutex::new(Instant::now()),
            _item: PhantomData,
        }
    }

    /// Append an item, flushing immediately if capacity is reached.
    pub async fn add(&self, item: &T) -> Result<()> {
        let data = serde_json::to_string(item)?;
        self.store.append(data, &self.config.config_key).await?;

        if self.store.len(&self.config.config_key).await? >= self.config.capacity {
            self.flush().await?;
        }
        Ok(())
    }

    /// Drain the batch and hand it to the delivery action.
    ///
    /// At most one flush executes at a time; a flush finding an empty
    /// batch returns without delivering.
    pub async fn flush(&self) -> Result<()> {
        let _gate = self.flush_gate.lock().await;

        let drained = self.store.drain(&self.config.config_key).await?;
        *self.last_flush.lock().await = Instant::now();
        if drained.is_empty() {
            return Ok(());
        }

        let mut items = Vec::with_capacity(drained.len());
        for data in &drained {
            items.push(serde_json::from_str(data)?);
        }

        // Delivery failure leaves the batch drained: at-most-once.
        (self.deliver)(items)
            .await
            .map_err(|e| Error::FlushDelivery {
                message: e.to_string(),
            })
    }

    /// Discard buffered items without delivering them (reset/abort)
    pub async fn clear(&self) -> Result<()> {
        self.store.clear(&self.config.config_key).await
    }

    /// Number of currently buffered items
    pub async fn len(&self) -> Result<usize> {
        self.store.len(&self.config.config_key).await
    }

    /// Spawn the idle-timeout flusher.
    ///
    /// The task runs until the returned handle is aborted. Idle flush
    /// failures are logged and the task keeps running; a failed
    /// delivery is surfaced on the next explicit `flush`/`add` only
    /// through its own result.
    pub fn spawn_idle_flush(self: Arc<Self>) -> JoinHandle<()> {
        let buffer = self;
        tokio::spawn(async move {
            loop {
                let deadline = *buffer.last_flush.lock().await + buffer.config.idle_timeout;
                tokio::time::sleep_until(deadline).await;

                let idle_for = buffer.last_flush.lock().await.elapsed();
                if idle_for >= buffer.config.idle_timeout {
                    if let Err(error) = buffer.flush().await {
                        warn!(%error, "idle flush failed");
                    }
                }
            }
        })
    }
}
