use super::{RateLimitError, RateLimitStore, WindowCount};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const SHARD_COUNT: usize = 16;
const MAX_BUCKETS_PER_SHARD: usize = 10_000;

struct Bucket {
    count: u32,
    window_start: Instant,
}

/// In-process counter store
///
/// Keys are spread over 16 mutex-guarded shards to keep lock contention down. Counts are
/// per process, so replicas each enforce their own limit.
pub struct MemoryRateLimitStore {
    shards: Vec<Mutex<HashMap<String, Bucket>>>,
    window: Duration,
}

impl MemoryRateLimitStore {
    pub fn new(window: Duration) -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
            window,
        }
    }

    fn shard(&self, key: &str) -> &Mutex<HashMap<String, Bucket>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }

    /// Number of tracked keys across all shards
    pub async fn len(&self) -> usize {
        let mut total = 0;
        for shard in &self.shards {
            total += shard.lock().await.len();
        }
        total
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn hit(&self, key: &str) -> Result<WindowCount, RateLimitError> {
        let now = Instant::now();
        let window = self.window;
        let mut buckets = self.shard(key).lock().await;

        if buckets.len() >= MAX_BUCKETS_PER_SHARD && !buckets.contains_key(key) {
            buckets.retain(|_, b| now.duration_since(b.window_start) < window);

            if buckets.len() >= MAX_BUCKETS_PER_SHARD {
                let oldest = buckets
                    .iter()
                    .min_by_key(|(_, b)| b.window_start)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    buckets.remove(&oldest);
                    tracing::debug!(
                        evicted_key = %oldest,
                        "Evicted oldest rate limit bucket at capacity"
                    );
                }
            }
        }

        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            count: 0,
            window_start: now,
        });

        if now.duration_since(bucket.window_start) >= window {
            bucket.count = 0;
            bucket.window_start = now;
        }
        bucket.count = bucket.count.saturating_add(1);

        Ok(WindowCount {
            count: bucket.count,
            reset_after: window.saturating_sub(now.duration_since(bucket.window_start)),
        })
    }

    async fn sweep(&self) -> Result<usize, RateLimitError> {
        let now = Instant::now();
        let mut removed = 0;
        for shard in &self.shards {
            let mut buckets = shard.lock().await;
            let before = buckets.len();
            buckets.retain(|_, b| now.duration_since(b.window_start) < self.window);
            removed += before - buckets.len();
        }
        Ok(removed)
    }
}
