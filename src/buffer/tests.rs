//! Tests for the write buffer and cache stores

use super::*;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

type Delivered = Arc<StdMutex<Vec<Vec<u32>>>>;

fn collecting_deliver(delivered: &Delivered) -> DeliveryFn<u32> {
    let delivered = Arc::clone(delivered);
    Arc::new(move |items| {
        let delivered = Arc::clone(&delivered);
        Box::pin(async move {
            delivered.lock().unwrap().push(items);
            Ok(())
        })
    })
}

fn failing_deliver() -> DeliveryFn<u32> {
    Arc::new(|_items| Box::pin(async { anyhow::bail!("remote refused the batch") }))
}

fn buffer_with(
    capacity: usize,
    idle: Duration,
    deliver: DeliveryFn<u32>,
) -> Arc<WriteBuffer<u32>> {
    let config = WriteBufferConfig::new()
        .with_capacity(capacity)
        .with_idle_timeout(idle)
        .with_config_key("test");
    Arc::new(WriteBuffer::new(Arc::new(MemoryStore::new()), config, deliver))
}

// ============================================================================
// WriteBuffer
// ============================================================================

#[tokio::test]
async fn test_capacity_trigger_delivers_in_add_order() {
    let delivered: Delivered = Arc::default();
    let buffer = buffer_with(3, Duration::from_secs(60), collecting_deliver(&delivered));

    for item in [10, 20] {
        buffer.add(&item).await.unwrap();
        assert!(delivered.lock().unwrap().is_empty());
    }
    buffer.add(&30).await.unwrap();

    let batches = delivered.lock().unwrap().clone();
    assert_eq!(batches, vec![vec![10, 20, 30]]);
    assert_eq!(buffer.len().await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_idle_trigger_flushes_partial_batch() {
    let delivered: Delivered = Arc::default();
    let buffer = buffer_with(
        100,
        Duration::from_millis(100),
        collecting_deliver(&delivered),
    );

    buffer.add(&1).await.unwrap();
    buffer.add(&2).await.unwrap();

    let idle_task = Arc::clone(&buffer).spawn_idle_flush();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let batches = delivered.lock().unwrap().clone();
    assert_eq!(batches, vec![vec![1, 2]]);
    assert_eq!(buffer.len().await.unwrap(), 0);
    idle_task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_idle_timer_quiet_on_empty_batch() {
    let delivered: Delivered = Arc::default();
    let buffer = buffer_with(
        100,
        Duration::from_millis(100),
        collecting_deliver(&delivered),
    );

    let idle_task = Arc::clone(&buffer).spawn_idle_flush();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(delivered.lock().unwrap().is_empty());
    idle_task.abort();
}

#[tokio::test]
async fn test_concurrent_flush_never_double_delivers() {
    let delivered: Delivered = Arc::default();
    let buffer = buffer_with(100, Duration::from_secs(60), collecting_deliver(&delivered));

    for item in 0..10 {
        buffer.add(&item).await.unwrap();
    }

    let a = buffer.flush();
    let b = buffer.flush();
    let (ra, rb) = tokio::join!(a, b);
    ra.unwrap();
    rb.unwrap();

    let batches = delivered.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0], (0..10).collect::<Vec<u32>>());
}

#[tokio::test]
async fn test_flush_on_empty_batch_is_noop() {
    let delivered: Delivered = Arc::default();
    let buffer = buffer_with(100, Duration::from_secs(60), collecting_deliver(&delivered));

    buffer.flush().await.unwrap();
    assert!(delivered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_delivery_failure_leaves_batch_drained() {
    let buffer = buffer_with(100, Duration::from_secs(60), failing_deliver());

    buffer.add(&1).await.unwrap();
    let err = buffer.flush().await.unwrap_err();
    assert!(matches!(err, crate::error::Error::FlushDelivery { .. }));

    // At-most-once: the failed batch is gone.
    assert_eq!(buffer.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_clear_discards_without_delivery() {
    let delivered: Delivered = Arc::default();
    let buffer = buffer_with(100, Duration::from_secs(60), collecting_deliver(&delivered));

    buffer.add(&1).await.unwrap();
    buffer.add(&2).await.unwrap();
    buffer.clear().await.unwrap();

    buffer.flush().await.unwrap();
    assert!(delivered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_adds_all_arrive() {
    let delivered: Delivered = Arc::default();
    let buffer = buffer_with(1000, Duration::from_secs(60), collecting_deliver(&delivered));

    let mut handles = Vec::new();
    for item in 0..50u32 {
        let buffer = Arc::clone(&buffer);
        handles.push(tokio::spawn(async move { buffer.add(&item).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    buffer.flush().await.unwrap();
    let batches = delivered.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    let mut items = batches[0].clone();
    items.sort_unstable();
    assert_eq!(items, (0..50).collect::<Vec<u32>>());
}

// ============================================================================
// MemoryStore
// ============================================================================

#[tokio::test]
async fn test_memory_store_scopes_by_config_key() {
    let store = MemoryStore::new();
    store.append("a1".to_string(), "a").await.unwrap();
    store.append("b1".to_string(), "b").await.unwrap();
    store.append("a2".to_string(), "a").await.unwrap();

    assert_eq!(store.len("a").await.unwrap(), 2);
    assert_eq!(store.len("b").await.unwrap(), 1);

    let drained = store.drain("a").await.unwrap();
    assert_eq!(drained, vec!["a1".to_string(), "a2".to_string()]);
    assert_eq!(store.len("a").await.unwrap(), 0);
    assert_eq!(store.len("b").await.unwrap(), 1);
}

// ============================================================================
// DuckDbStore
// ============================================================================

#[tokio::test]
async fn test_duckdb_store_roundtrip() {
    let store = DuckDbStore::open_in_memory().unwrap();
    store.append("one".to_string(), "key").await.unwrap();
    store.append("two".to_string(), "key").await.unwrap();
    store.append("other".to_string(), "elsewhere").await.unwrap();

    assert_eq!(store.len("key").await.unwrap(), 2);
    let drained = store.drain("key").await.unwrap();
    assert_eq!(drained, vec!["one".to_string(), "two".to_string()]);
    assert_eq!(store.len("key").await.unwrap(), 0);
    assert_eq!(store.len("elsewhere").await.unwrap(), 1);
}

#[tokio::test]
async fn test_duckdb_store_clear_scoped_by_key() {
    let store = DuckDbStore::open_in_memory().unwrap();
    store.append("one".to_string(), "a").await.unwrap();
    store.append("two".to_string(), "b").await.unwrap();

    store.clear("a").await.unwrap();
    assert_eq!(store.len("a").await.unwrap(), 0);
    assert_eq!(store.len("b").await.unwrap(), 1);
}

#[tokio::test]
async fn test_duckdb_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("write_cache.duckdb");

    {
        let store = DuckDbStore::open(&path).unwrap();
        store.append("persisted".to_string(), "key").await.unwrap();
    }

    let store = DuckDbStore::open(&path).unwrap();
    let drained = store.drain("key").await.unwrap();
    assert_eq!(drained, vec!["persisted".to_string()]);
}

#[test]
fn test_duckdb_open_failure_names_the_path() {
    // A directory is not a database file; the error carries the path.
    let dir = tempfile::tempdir().unwrap();
    let err = DuckDbStore::open(dir.path()).unwrap_err();
    assert!(err.to_string().contains("opening write cache"));
}

#[test]
fn test_duckdb_settings_fallback() {
    use std::collections::HashMap;

    let empty: HashMap<String, String> = HashMap::new();
    let err = DuckDbStore::from_settings(&empty).unwrap_err();
    assert!(matches!(err, crate::error::Error::Config { .. }));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fallback.duckdb");
    let mut settings = HashMap::new();
    settings.insert(
        FALLBACK_CONNECTION_KEY.to_string(),
        path.to_string_lossy().into_owned(),
    );
    assert!(DuckDbStore::from_settings(&settings).is_ok());
}
