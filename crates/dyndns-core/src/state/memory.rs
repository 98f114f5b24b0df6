// # Memory Run Stamp Store
//
// In-memory implementation of RunStampStore.
//
// Nothing survives a restart, so every new process passes the rate
// limiter on its first check. Useful for tests and for embedding the
// engine in a process that does its own scheduling.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::RunStampStore;

/// In-memory run stamp store
///
/// Clones share the same underlying value, so a test can keep one handle
/// and hand another to the engine.
///
/// # Example
///
/// ```rust
/// use dyndns_core::state::MemoryRunStampStore;
/// use dyndns_core::traits::RunStampStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRunStampStore::new();
///     assert_eq!(store.last_run().await?, None);
///
///     store.record_run(1_700_000_000.5).await?;
///     assert_eq!(store.last_run().await?, Some(1_700_000_000.5));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRunStampStore {
    inner: Arc<RwLock<Option<f64>>>,
}

impl MemoryRunStampStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a timestamp
    pub fn with_last_run(timestamp: f64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(timestamp))),
        }
    }
}

#[async_trait]
impl RunStampStore for MemoryRunStampStore {
    async fn last_run(&self) -> Result<Option<f64>, Error> {
        Ok(*self.inner.read().await)
    }

    async fn record_run(&self, timestamp: f64) -> Result<(), Error> {
        *self.inner.write().await = Some(timestamp);
        Ok(())
    }
}
