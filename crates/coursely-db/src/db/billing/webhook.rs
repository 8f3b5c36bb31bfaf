use coursely_core::models::{NewWebhookRecord, WebhookProvider, WebhookRecord};
use coursely_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Append-only log of inbound gateway callbacks
#[async_trait::async_trait]
pub trait WebhookRecordRepositoryTrait: Send + Sync {
    async fn insert(&self, record: NewWebhookRecord) -> Result<WebhookRecord, AppError>;

    /// A different, already processed record for the same provider event.
    async fn find_processed_duplicate(
        &self,
        provider: WebhookProvider,
        event_id: &str,
        exclude_id: Uuid,
    ) -> Result<Option<WebhookRecord>, AppError>;

    async fn mark_processed(&self, id: Uuid) -> Result<(), AppError>;

    async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<(), AppError>;

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<WebhookRecord>, AppError>;
}

#[derive(Clone)]
pub struct WebhookRecordRepository {
    pool: PgPool,
}

impl WebhookRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl WebhookRecordRepositoryTrait for WebhookRecordRepository {
    #[tracing::instrument(skip(self, record), fields(db.table = "webhook_records", db.operation = "insert", provider = %record.provider))]
    async fn insert(&self, record: NewWebhookRecord) -> Result<WebhookRecord, AppError> {
        let created = sqlx::query_as::<Postgres, WebhookRecord>(
            r#"
            INSERT INTO webhook_records (provider, event_type, event_id, payload, signature_verified, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING *
            "#,
        )
        .bind(record.provider)
        .bind(&record.event_type)
        .bind(&record.event_id)
        .bind(&record.payload)
        .bind(record.signature_verified)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "webhook_records", db.operation = "select"))]
    async fn find_processed_duplicate(
        &self,
        provider: WebhookProvider,
        event_id: &str,
        exclude_id: Uuid,
    ) -> Result<Option<WebhookRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, WebhookRecord>(
            r#"
            SELECT * FROM webhook_records
            WHERE provider = $1 AND event_id = $2 AND id <> $3
              AND status = 'processed' AND signature_verified
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(provider)
        .bind(event_id)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "webhook_records", db.operation = "update"))]
    async fn mark_processed(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE webhook_records
            SET status = 'processed', processed_at = NOW(), error_message = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, error_message), fields(db.table = "webhook_records", db.operation = "update"))]
    async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE webhook_records
            SET status = 'failed', processed_at = NOW(), error_message = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "webhook_records", db.operation = "select"))]
    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<WebhookRecord>, AppError> {
        let records = sqlx::query_as::<Postgres, WebhookRecord>(
            "SELECT * FROM webhook_records ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}
