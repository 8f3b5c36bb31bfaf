//! Database transaction utilities
//!
//! Multi-row mutations (payment completion, refund accounting, certificate issuance,
//! invoice numbering) run inside a `TransactionGuard`. Dropping a guard without
//! committing rolls the transaction back.

use coursely_core::AppError;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::future::Future;
use std::pin::Pin;

/// Named transaction wrapper with traced begin/commit
///
/// ```ignore
/// let mut tx = TransactionGuard::begin(&pool, "record_refund").await?;
/// sqlx::query("UPDATE ...").execute(tx.conn()).await?;
/// tx.commit().await?;
/// ```
pub struct TransactionGuard<'a> {
    transaction: Transaction<'a, Postgres>,
    label: &'static str,
}

impl<'a> TransactionGuard<'a> {
    pub async fn begin(pool: &'a PgPool, label: &'static str) -> Result<Self, AppError> {
        let transaction = pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, tx = label, "Failed to begin database transaction");
            AppError::from(e)
        })?;
        tracing::trace!(tx = label, "Transaction started");
        Ok(Self { transaction, label })
    }

    /// Connection to run statements on.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.transaction
    }

    pub async fn commit(self) -> Result<(), AppError> {
        let label = self.label;
        self.transaction.commit().await.map_err(|e| {
            tracing::error!(error = %e, tx = label, "Failed to commit database transaction");
            AppError::from(e)
        })?;
        tracing::trace!(tx = label, "Transaction committed");
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), AppError> {
        let label = self.label;
        self.transaction.rollback().await.map_err(|e| {
            tracing::warn!(error = %e, tx = label, "Failed to roll back database transaction");
            AppError::from(e)
        })?;
        Ok(())
    }

    /// Serializes concurrent holders of the same key until this transaction ends.
    pub async fn advisory_lock(&mut self, key: &str) -> Result<(), AppError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(key)
            .execute(self.conn())
            .await?;
        Ok(())
    }
}

/// Execute a closure within a database transaction
///
/// Commits when the closure returns `Ok`, rolls back otherwise.
///
/// ```ignore
/// with_transaction(&pool, |conn| Box::pin(async move {
///     sqlx::query("UPDATE ...").execute(&mut *conn).await?;
///     Ok(())
/// })).await
/// ```
pub async fn with_transaction<F, R>(pool: &PgPool, f: F) -> Result<R, AppError>
where
    F: for<'c> FnOnce(
        &'c mut PgConnection,
    ) -> Pin<Box<dyn Future<Output = Result<R, AppError>> + Send + 'c>>,
{
    let mut tx = pool.begin().await?;

    match f(&mut tx).await {
        Ok(result) => {
            tx.commit().await?;
            Ok(result)
        }
        Err(e) => {
            tx.rollback().await.ok();
            Err(e)
        }
    }
}
