use chrono::Utc;
use coursely_core::models::{Invoice, NewInvoice};
use coursely_core::money::{invoice_prefix, next_invoice_number};
use coursely_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::db::transaction::TransactionGuard;

#[async_trait::async_trait]
pub trait InvoiceRepositoryTrait: Send + Sync {
    /// Inserts a `draft` invoice with the next `INV-YYYYMM-NNNN` number.
    async fn create_draft(&self, invoice: NewInvoice) -> Result<Invoice, AppError>;

    /// Deletes a draft invoice. Paid invoices are never deleted.
    async fn delete_draft(&self, id: Uuid) -> Result<bool, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, AppError>;

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Invoice>, AppError>;
}

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl InvoiceRepositoryTrait for InvoiceRepository {
    #[tracing::instrument(skip(self, invoice), fields(db.table = "invoices", db.operation = "insert"))]
    async fn create_draft(&self, invoice: NewInvoice) -> Result<Invoice, AppError> {
        let prefix = invoice_prefix(Utc::now());
        let mut tx = TransactionGuard::begin(&self.pool, "create_invoice").await?;

        // Held until commit so concurrent creations in the same month number sequentially
        tx.advisory_lock(&prefix).await?;

        let latest: Option<String> = sqlx::query_scalar(
            r#"
            SELECT invoice_number FROM invoices
            WHERE invoice_number LIKE $1 || '-%'
            ORDER BY length(invoice_number) DESC, invoice_number DESC
            LIMIT 1
            "#,
        )
        .bind(&prefix)
        .fetch_optional(tx.conn())
        .await?;

        let number = next_invoice_number(&prefix, latest.as_deref());

        let created = sqlx::query_as::<Postgres, Invoice>(
            r#"
            INSERT INTO invoices (
                invoice_number, user_id, tenant_id, course_id, subscription_id,
                subtotal, tax_amount, total_amount, currency, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'draft')
            RETURNING *
            "#,
        )
        .bind(&number)
        .bind(invoice.user_id)
        .bind(invoice.tenant_id)
        .bind(invoice.course_id)
        .bind(invoice.subscription_id)
        .bind(invoice.subtotal)
        .bind(invoice.tax_amount)
        .bind(invoice.total_amount)
        .bind(&invoice.currency)
        .fetch_one(tx.conn())
        .await?;

        tx.commit().await?;

        tracing::debug!(invoice_id = %created.id, invoice_number = %created.invoice_number, "Created draft invoice");
        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "invoices", db.operation = "delete"))]
    async fn delete_draft(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1 AND status = 'draft'")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "invoices", db.operation = "select"))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let invoice = sqlx::query_as::<Postgres, Invoice>("SELECT * FROM invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invoice)
    }

    #[tracing::instrument(skip(self), fields(db.table = "invoices", db.operation = "select"))]
    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<Postgres, Invoice>(
            r#"
            SELECT * FROM invoices
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
        Ok(invoices)
    }
}
