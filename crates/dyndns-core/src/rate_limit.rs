//! Run-frequency gate
//!
//! The provider API allows roughly one request per minute per token, and
//! the agent is usually started by a scheduler that knows nothing about
//! that. The rate limiter keeps the time of the last run that passed the
//! gate and refuses to let another one through within `min_interval`.
//!
//! The stamp is written as soon as a run is allowed, before any network
//! call, so failed runs consume the window too.

use crate::error::Result;
use crate::traits::RunStampStore;
use std::time::Duration;

/// Minimum interval between two runs, in seconds
pub const DEFAULT_MIN_INTERVAL_SECS: u64 = 55;

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLimitDecision {
    /// The run may continue; the new stamp has been persisted
    Proceed,
    /// The previous run was too recent
    Blocked {
        /// Seconds since the previous run
        elapsed_secs: f64,
    },
}

/// Gate backed by a [`RunStampStore`]
pub struct RateLimiter {
    store: Box<dyn RunStampStore>,
    min_interval: Duration,
}

impl RateLimiter {
    /// Create a rate limiter
    pub fn new(store: Box<dyn RunStampStore>, min_interval: Duration) -> Self {
        Self {
            store,
            min_interval,
        }
    }

    /// Configured minimum interval
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Check the gate against the current wall clock
    pub async fn check(&self) -> Result<RateLimitDecision> {
        self.check_at(now_secs()).await
    }

    /// Check the gate as if the current time were `now` (Unix seconds)
    ///
    /// A missing or unreadable stamp counts as zero. A stamp in the future
    /// yields a negative elapsed time and blocks.
    pub async fn check_at(&self, now: f64) -> Result<RateLimitDecision> {
        let last_run = self.store.last_run().await?.unwrap_or(0.0);
        let elapsed_secs = now - last_run;

        if elapsed_secs < self.min_interval.as_secs_f64() {
            tracing::debug!(
                "Last run {:.1}s ago, minimum interval is {}s",
                elapsed_secs,
                self.min_interval.as_secs()
            );
            return Ok(RateLimitDecision::Blocked { elapsed_secs });
        }

        self.store.record_run(now).await?;
        Ok(RateLimitDecision::Proceed)
    }
}

/// Current wall clock time as Unix seconds
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryRunStampStore;

    fn limiter(store: &MemoryRunStampStore) -> RateLimiter {
        RateLimiter::new(
            Box::new(store.clone()),
            Duration::from_secs(DEFAULT_MIN_INTERVAL_SECS),
        )
    }

    #[tokio::test]
    async fn test_first_run_proceeds_and_records() {
        let store = MemoryRunStampStore::new();

        let decision = limiter(&store).check_at(1_000.0).await.unwrap();

        assert_eq!(decision, RateLimitDecision::Proceed);
        assert_eq!(store.last_run().await.unwrap(), Some(1_000.0));
    }

    #[tokio::test]
    async fn test_recent_run_blocks_without_touching_stamp() {
        let store = MemoryRunStampStore::with_last_run(1_000.0);

        let decision = limiter(&store).check_at(1_054.9).await.unwrap();

        match decision {
            RateLimitDecision::Blocked { elapsed_secs } => {
                assert!((elapsed_secs - 54.9).abs() < 1e-6);
            }
            other => panic!("expected Blocked, got {:?}", other),
        }
        assert_eq!(store.last_run().await.unwrap(), Some(1_000.0));
    }

    #[tokio::test]
    async fn test_exact_interval_proceeds() {
        let store = MemoryRunStampStore::with_last_run(1_000.0);

        let decision = limiter(&store).check_at(1_055.0).await.unwrap();

        assert_eq!(decision, RateLimitDecision::Proceed);
        assert_eq!(store.last_run().await.unwrap(), Some(1_055.0));
    }

    #[tokio::test]
    async fn test_future_stamp_blocks() {
        let store = MemoryRunStampStore::with_last_run(2_000.0);

        let decision = limiter(&store).check_at(1_000.0).await.unwrap();

        assert!(matches!(decision, RateLimitDecision::Blocked { .. }));
    }

    #[test]
    fn test_now_secs_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(now_secs() > 1_577_836_800.0);
    }
}
