// # Run Stamp Store Trait
//
// Defines the interface for persisting the time of the last run that
// passed the rate limiter.
//
// ## Implementations
//
// - File-based: plain text file holding one float (`FileRunStampStore`)
// - In-memory: tests and embedding (`MemoryRunStampStore`)

use async_trait::async_trait;

/// Trait for run stamp store implementations
///
/// Timestamps are seconds since the Unix epoch as `f64`.
///
/// # Concurrency
///
/// Stores assume a single writer. Two agents sharing one store may both
/// pass the rate limiter.
#[async_trait]
pub trait RunStampStore: Send + Sync {
    /// Read the last persisted run timestamp
    ///
    /// # Returns
    ///
    /// - `Ok(Some(f64))`: The stored timestamp
    /// - `Ok(None)`: Nothing stored yet, or the stored value is unreadable
    /// - `Err(Error)`: Storage could not be accessed
    async fn last_run(&self) -> Result<Option<f64>, crate::Error>;

    /// Persist a new run timestamp, replacing the previous one
    async fn record_run(&self, timestamp: f64) -> Result<(), crate::Error>;
}
