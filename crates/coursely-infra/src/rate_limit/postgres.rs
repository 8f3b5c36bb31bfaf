use super::{RateLimitError, RateLimitStore, WindowCount};
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

/// Counter store backed by the `rate_limit_counters` table
///
/// Every replica shares the same counts. The window check and increment happen in a single
/// upsert, so concurrent hits on one key never lose an increment.
pub struct PostgresRateLimitStore {
    pool: PgPool,
    window: Duration,
}

impl PostgresRateLimitStore {
    pub fn new(pool: PgPool, window: Duration) -> Self {
        Self { pool, window }
    }
}

#[async_trait]
impl RateLimitStore for PostgresRateLimitStore {
    async fn hit(&self, key: &str) -> Result<WindowCount, RateLimitError> {
        let window_secs = self.window.as_secs_f64();

        let (count, reset_after): (i32, f64) = sqlx::query_as(
            r#"
            INSERT INTO rate_limit_counters (key, window_start, count)
            VALUES ($1, NOW(), 1)
            ON CONFLICT (key) DO UPDATE SET
                count = CASE
                    WHEN rate_limit_counters.window_start + $2::float8 * INTERVAL '1 second' <= NOW()
                    THEN 1
                    ELSE rate_limit_counters.count + 1
                END,
                window_start = CASE
                    WHEN rate_limit_counters.window_start + $2::float8 * INTERVAL '1 second' <= NOW()
                    THEN NOW()
                    ELSE rate_limit_counters.window_start
                END
            RETURNING
                count,
                GREATEST(
                    EXTRACT(EPOCH FROM (window_start + $2::float8 * INTERVAL '1 second' - NOW())),
                    0
                )::float8 AS reset_after
            "#,
        )
        .bind(key)
        .bind(window_secs)
        .fetch_one(&self.pool)
        .await?;

        Ok(WindowCount {
            count: u32::try_from(count).unwrap_or(u32::MAX),
            reset_after: Duration::from_secs_f64(reset_after.max(0.0)),
        })
    }

    async fn sweep(&self) -> Result<usize, RateLimitError> {
        let result = sqlx::query(
            "DELETE FROM rate_limit_counters WHERE window_start + $1::float8 * INTERVAL '1 second' <= NOW()",
        )
        .bind(self.window.as_secs_f64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() as usize)
    }
}
