use coursely_core::models::{NewPayment, Payment, PaymentStatus};
use coursely_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::db::transaction::TransactionGuard;

#[async_trait::async_trait]
pub trait PaymentRepositoryTrait: Send + Sync {
    async fn insert_pending(&self, payment: NewPayment) -> Result<Payment, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, AppError>;

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, AppError>;

    /// Marks the payment completed, its invoice paid and activates the course enrollment,
    /// atomically. A payment that is already past `pending`/`failed` is returned unchanged.
    async fn complete(&self, id: Uuid, gateway_payment_id: &str) -> Result<Payment, AppError>;

    /// Moves a `pending` payment to `failed`. Returns `None` when it was not pending.
    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<Option<Payment>, AppError>;

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payment>, AppError>;

    /// Whether the user paid for the course. A partial refund still counts as paid.
    async fn has_completed_course_payment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PaymentRepositoryTrait for PaymentRepository {
    #[tracing::instrument(skip(self, payment), fields(db.table = "payments", db.operation = "insert"))]
    async fn insert_pending(&self, payment: NewPayment) -> Result<Payment, AppError> {
        let payment = sqlx::query_as::<Postgres, Payment>(
            r#"
            INSERT INTO payments (
                user_id, tenant_id, course_id, subscription_id, amount, currency,
                payment_method, order_id, invoice_id, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending')
            RETURNING *
            "#,
        )
        .bind(payment.user_id)
        .bind(payment.tenant_id)
        .bind(payment.course_id)
        .bind(payment.subscription_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.payment_method)
        .bind(&payment.order_id)
        .bind(payment.invoice_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            payment_id = %payment.id,
            order_id = %payment.order_id,
            amount = %payment.amount,
            "Created pending payment"
        );
        Ok(payment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "payments", db.operation = "select"))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, AppError> {
        let payment = sqlx::query_as::<Postgres, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(payment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "payments", db.operation = "select"))]
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, AppError> {
        let payment =
            sqlx::query_as::<Postgres, Payment>("SELECT * FROM payments WHERE order_id = $1")
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(payment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "payments", db.operation = "update"))]
    async fn complete(&self, id: Uuid, gateway_payment_id: &str) -> Result<Payment, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "complete_payment").await?;

        let current = sqlx::query_as::<Postgres, Payment>(
            "SELECT * FROM payments WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(tx.conn())
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        if !matches!(current.status, PaymentStatus::Pending | PaymentStatus::Failed) {
            tx.rollback().await?;
            return Ok(current);
        }

        let payment = sqlx::query_as::<Postgres, Payment>(
            r#"
            UPDATE payments
            SET status = 'completed', payment_id = $2, failure_reason = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(gateway_payment_id)
        .fetch_one(tx.conn())
        .await?;

        if let Some(invoice_id) = payment.invoice_id {
            sqlx::query(
                r#"
                UPDATE invoices
                SET status = 'paid', paid_at = NOW(), updated_at = NOW()
                WHERE id = $1 AND status = 'draft'
                "#,
            )
            .bind(invoice_id)
            .execute(tx.conn())
            .await?;
        }

        if let Some(course_id) = payment.course_id {
            sqlx::query(
                r#"
                INSERT INTO enrollments (user_id, course_id, tenant_id, status)
                VALUES ($1, $2, $3, 'active')
                ON CONFLICT (user_id, course_id) DO UPDATE
                SET status = CASE
                        WHEN enrollments.status = 'cancelled' THEN 'active'::enrollment_status
                        ELSE enrollments.status
                    END,
                    updated_at = NOW()
                "#,
            )
            .bind(payment.user_id)
            .bind(course_id)
            .bind(payment.tenant_id)
            .execute(tx.conn())
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            payment_id = %payment.id,
            gateway_payment_id = %gateway_payment_id,
            "Payment completed"
        );
        Ok(payment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "payments", db.operation = "update"))]
    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<Option<Payment>, AppError> {
        let payment = sqlx::query_as::<Postgres, Payment>(
            r#"
            UPDATE payments
            SET status = 'failed', failure_reason = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?;
        Ok(payment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "payments", db.operation = "select"))]
    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<Postgres, Payment>(
            r#"
            SELECT * FROM payments
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    #[tracing::instrument(skip(self), fields(db.table = "payments", db.operation = "select"))]
    async fn has_completed_course_payment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM payments
                WHERE user_id = $1 AND course_id = $2
                  AND status IN ('completed', 'partially_refunded')
            )
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
