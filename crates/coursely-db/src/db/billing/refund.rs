use coursely_core::models::{NewRefund, Payment, Refund, RefundStatus};
use coursely_core::money::payment_status_after_refunds;
use coursely_core::AppError;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::db::transaction::TransactionGuard;

/// Refund accounting
///
/// A refund is first reserved as `pending` (counted against the payment's refundable
/// balance), then finalized once the gateway answers. `refunded_amount` on the payment is
/// always the sum of its non-failed refunds.
#[async_trait::async_trait]
pub trait RefundRepositoryTrait: Send + Sync {
    /// Locks the payment, checks refundability and the remaining balance, inserts the
    /// refund and recomputes the payment totals.
    async fn reserve(&self, refund: NewRefund) -> Result<(Refund, Payment), AppError>;

    /// Sets the outcome of a reserved refund and recomputes the payment totals.
    async fn finalize(
        &self,
        refund_id: Uuid,
        status: RefundStatus,
        provider_refund_id: Option<&str>,
    ) -> Result<(Refund, Payment), AppError>;

    /// Applies a gateway-reported outcome by provider refund id.
    async fn set_status_by_provider_id(
        &self,
        provider_refund_id: &str,
        status: RefundStatus,
    ) -> Result<Option<(Refund, Payment)>, AppError>;

    async fn list_for_payment(&self, payment_id: Uuid) -> Result<Vec<Refund>, AppError>;
}

#[derive(Clone)]
pub struct RefundRepository {
    pool: PgPool,
}

impl RefundRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Recomputes `refunded_amount` and the derived status of a payment from its refunds.
async fn recompute_payment(conn: &mut PgConnection, payment_id: Uuid) -> Result<Payment, AppError> {
    let payment = sqlx::query_as::<Postgres, Payment>(
        "SELECT * FROM payments WHERE id = $1 FOR UPDATE",
    )
    .bind(payment_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

    let refunded: Decimal = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(amount), 0)
        FROM refunds
        WHERE payment_id = $1 AND status <> 'failed'
        "#,
    )
    .bind(payment_id)
    .fetch_one(&mut *conn)
    .await?;

    if refunded > payment.amount {
        return Err(AppError::Conflict(
            "Refunds exceed the payment amount".to_string(),
        ));
    }

    let status = payment_status_after_refunds(payment.status, payment.amount, refunded);

    let updated = sqlx::query_as::<Postgres, Payment>(
        r#"
        UPDATE payments
        SET refunded_amount = $2, status = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(payment_id)
    .bind(refunded)
    .bind(status)
    .fetch_one(&mut *conn)
    .await?;

    Ok(updated)
}

#[async_trait::async_trait]
impl RefundRepositoryTrait for RefundRepository {
    #[tracing::instrument(skip(self, refund), fields(db.table = "refunds", db.operation = "insert", payment_id = %refund.payment_id))]
    async fn reserve(&self, refund: NewRefund) -> Result<(Refund, Payment), AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "reserve_refund").await?;

        let payment = sqlx::query_as::<Postgres, Payment>(
            "SELECT * FROM payments WHERE id = $1 FOR UPDATE",
        )
        .bind(refund.payment_id)
        .fetch_optional(tx.conn())
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        if !payment.status.is_refundable() {
            return Err(AppError::Conflict(format!(
                "Payment with status {} cannot be refunded",
                payment.status
            )));
        }

        if payment.refunded_amount + refund.amount > payment.amount {
            return Err(AppError::InvalidInput(format!(
                "Refund of {} exceeds the refundable balance of {}",
                refund.amount,
                payment.amount - payment.refunded_amount
            )));
        }

        let created = sqlx::query_as::<Postgres, Refund>(
            r#"
            INSERT INTO refunds (payment_id, amount, reason, notes, status, provider_refund_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(refund.payment_id)
        .bind(refund.amount)
        .bind(refund.reason)
        .bind(&refund.notes)
        .bind(refund.status)
        .bind(&refund.provider_refund_id)
        .bind(refund.created_by)
        .fetch_one(tx.conn())
        .await?;

        let payment = recompute_payment(tx.conn(), created.payment_id).await?;
        tx.commit().await?;

        Ok((created, payment))
    }

    #[tracing::instrument(skip(self), fields(db.table = "refunds", db.operation = "update"))]
    async fn finalize(
        &self,
        refund_id: Uuid,
        status: RefundStatus,
        provider_refund_id: Option<&str>,
    ) -> Result<(Refund, Payment), AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "finalize_refund").await?;

        let refund = sqlx::query_as::<Postgres, Refund>(
            r#"
            UPDATE refunds
            SET status = $2,
                provider_refund_id = COALESCE($3, provider_refund_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(refund_id)
        .bind(status)
        .bind(provider_refund_id)
        .fetch_optional(tx.conn())
        .await?
        .ok_or_else(|| AppError::NotFound("Refund not found".to_string()))?;

        let payment = recompute_payment(tx.conn(), refund.payment_id).await?;
        tx.commit().await?;

        Ok((refund, payment))
    }

    #[tracing::instrument(skip(self), fields(db.table = "refunds", db.operation = "update"))]
    async fn set_status_by_provider_id(
        &self,
        provider_refund_id: &str,
        status: RefundStatus,
    ) -> Result<Option<(Refund, Payment)>, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "refund_status_webhook").await?;

        let refund = sqlx::query_as::<Postgres, Refund>(
            r#"
            UPDATE refunds
            SET status = $2, updated_at = NOW()
            WHERE provider_refund_id = $1
            RETURNING *
            "#,
        )
        .bind(provider_refund_id)
        .bind(status)
        .fetch_optional(tx.conn())
        .await?;

        let Some(refund) = refund else {
            tx.rollback().await?;
            return Ok(None);
        };

        let payment = recompute_payment(tx.conn(), refund.payment_id).await?;
        tx.commit().await?;

        Ok(Some((refund, payment)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "refunds", db.operation = "select"))]
    async fn list_for_payment(&self, payment_id: Uuid) -> Result<Vec<Refund>, AppError> {
        let refunds = sqlx::query_as::<Postgres, Refund>(
            "SELECT * FROM refunds WHERE payment_id = $1 ORDER BY created_at",
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(refunds)
    }
}
