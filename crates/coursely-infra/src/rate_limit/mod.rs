//! Fixed-window rate limiting
//!
//! A [`RateLimiter`] counts hits per key in a [`RateLimitStore`]. Two stores exist: a
//! sharded in-process map for single-instance deployments and a PostgreSQL table for
//! deployments with several replicas behind a load balancer.
//!
//! Store failures never block traffic. The limiter logs a warning and lets the request
//! through.

mod memory;
#[cfg(feature = "rate-limit-postgres")]
mod postgres;

pub use memory::MemoryRateLimitStore;
#[cfg(feature = "rate-limit-postgres")]
pub use postgres::PostgresRateLimitStore;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How often expired windows are swept from the store
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limit store unavailable: {0}")]
    Store(String),
}

#[cfg(feature = "rate-limit-postgres")]
impl From<sqlx::Error> for RateLimitError {
    fn from(err: sqlx::Error) -> Self {
        RateLimitError::Store(err.to_string())
    }
}

/// Hit count for the current window of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    /// Hits in the window, including the one just recorded
    pub count: u32,
    /// Time until the window closes
    pub reset_after: Duration,
}

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Records one hit for `key`, opening a new window if the previous one has closed.
    async fn hit(&self, key: &str) -> Result<WindowCount, RateLimitError>;

    /// Removes closed windows. Returns the number removed.
    async fn sweep(&self) -> Result<usize, RateLimitError>;
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the window resets, at least 1
    pub retry_after: u64,
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    limit: u32,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, limit: u32) -> Self {
        Self { store, limit }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn store(&self) -> Arc<dyn RateLimitStore> {
        self.store.clone()
    }

    /// The request that brings the count to exactly `limit` is still allowed.
    pub async fn check(&self, key: &str) -> RateDecision {
        match self.store.hit(key).await {
            Ok(window) => RateDecision {
                allowed: window.count <= self.limit,
                limit: self.limit,
                remaining: self.limit.saturating_sub(window.count),
                retry_after: window.reset_after.as_secs().max(1),
            },
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Rate limit store failed, allowing request");
                RateDecision {
                    allowed: true,
                    limit: self.limit,
                    remaining: self.limit,
                    retry_after: 1,
                }
            }
        }
    }
}

/// Spawns a task that sweeps `store` every `interval` until the runtime shuts down.
pub fn spawn_sweeper(store: Arc<dyn RateLimitStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.sweep().await {
                Ok(0) => {}
                Ok(removed) => {
                    tracing::debug!(removed = removed, "Swept expired rate limit windows")
                }
                Err(e) => tracing::warn!(error = %e, "Rate limit sweep failed"),
            }
        }
    })
}
