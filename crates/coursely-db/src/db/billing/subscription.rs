use coursely_core::models::{CreatePlanRequest, NewSubscription, Subscription, SubscriptionPlan};
use coursely_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait SubscriptionRepositoryTrait: Send + Sync {
    async fn create_plan(
        &self,
        tenant_id: Option<Uuid>,
        plan: &CreatePlanRequest,
    ) -> Result<SubscriptionPlan, AppError>;

    async fn get_plan(&self, id: Uuid) -> Result<Option<SubscriptionPlan>, AppError>;

    /// Active plans visible to a tenant: its own plus global ones.
    async fn list_active_plans(
        &self,
        tenant_id: Option<Uuid>,
    ) -> Result<Vec<SubscriptionPlan>, AppError>;

    async fn create(&self, subscription: NewSubscription) -> Result<Subscription, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Subscription>, AppError>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Subscription>, AppError>;

    /// Flags an active subscription as cancelled. Returns `None` if it was not active.
    async fn cancel(&self, id: Uuid) -> Result<Option<Subscription>, AppError>;
}

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SubscriptionRepositoryTrait for SubscriptionRepository {
    #[tracing::instrument(skip(self, plan), fields(db.table = "subscription_plans", db.operation = "insert"))]
    async fn create_plan(
        &self,
        tenant_id: Option<Uuid>,
        plan: &CreatePlanRequest,
    ) -> Result<SubscriptionPlan, AppError> {
        let created = sqlx::query_as::<Postgres, SubscriptionPlan>(
            r#"
            INSERT INTO subscription_plans (
                tenant_id, name, description, price, currency, "interval", interval_count, trial_days
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.price)
        .bind(&plan.currency)
        .bind(plan.interval)
        .bind(plan.interval_count)
        .bind(plan.trial_days)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(plan_id = %created.id, name = %created.name, "Created subscription plan");
        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "subscription_plans", db.operation = "select"))]
    async fn get_plan(&self, id: Uuid) -> Result<Option<SubscriptionPlan>, AppError> {
        let plan = sqlx::query_as::<Postgres, SubscriptionPlan>(
            "SELECT * FROM subscription_plans WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(plan)
    }

    #[tracing::instrument(skip(self), fields(db.table = "subscription_plans", db.operation = "select"))]
    async fn list_active_plans(
        &self,
        tenant_id: Option<Uuid>,
    ) -> Result<Vec<SubscriptionPlan>, AppError> {
        let plans = sqlx::query_as::<Postgres, SubscriptionPlan>(
            r#"
            SELECT * FROM subscription_plans
            WHERE is_active AND (tenant_id IS NULL OR tenant_id = $1)
            ORDER BY price
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(plans)
    }

    #[tracing::instrument(skip(self, subscription), fields(db.table = "subscriptions", db.operation = "insert"))]
    async fn create(&self, subscription: NewSubscription) -> Result<Subscription, AppError> {
        let created = sqlx::query_as::<Postgres, Subscription>(
            r#"
            INSERT INTO subscriptions (
                user_id, plan_id, tenant_id, status, current_period_start, current_period_end,
                trial_start, trial_end
            )
            VALUES ($1, $2, $3, 'active', $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(subscription.user_id)
        .bind(subscription.plan_id)
        .bind(subscription.tenant_id)
        .bind(subscription.current_period_start)
        .bind(subscription.current_period_end)
        .bind(subscription.trial_start)
        .bind(subscription.trial_end)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    async fn get(&self, id: Uuid) -> Result<Option<Subscription>, AppError> {
        let subscription =
            sqlx::query_as::<Postgres, Subscription>("SELECT * FROM subscriptions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(subscription)
    }

    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Subscription>, AppError> {
        let subscriptions = sqlx::query_as::<Postgres, Subscription>(
            "SELECT * FROM subscriptions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subscriptions)
    }

    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "update"))]
    async fn cancel(&self, id: Uuid) -> Result<Option<Subscription>, AppError> {
        let subscription = sqlx::query_as::<Postgres, Subscription>(
            r#"
            UPDATE subscriptions
            SET status = 'cancelled', cancelled_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subscription)
    }
}
