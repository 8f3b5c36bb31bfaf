//! Subscription plans and subscriptions

use chrono::{Duration, Utc};
use coursely_core::models::{
    CreatePlanRequest, CreateSubscriptionRequest, NewSubscription, Subscription,
    SubscriptionPlan, SubscriptionStatus, UserRole,
};
use coursely_core::AppError;
use coursely_db::SubscriptionRepositoryTrait;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::actor::Actor;

#[derive(Clone)]
pub struct SubscriptionService {
    subscriptions: Arc<dyn SubscriptionRepositoryTrait>,
}

impl SubscriptionService {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepositoryTrait>) -> Self {
        Self { subscriptions }
    }

    pub async fn create_plan(
        &self,
        actor: &Actor,
        request: CreatePlanRequest,
    ) -> Result<SubscriptionPlan, AppError> {
        actor.require(UserRole::Admin)?;
        request.validate()?;
        let plan = self
            .subscriptions
            .create_plan(Some(actor.tenant_id), &request)
            .await?;
        tracing::info!(plan_id = %plan.id, tenant_id = %actor.tenant_id, "Subscription plan created");
        Ok(plan)
    }

    /// Active plans visible to a tenant, platform-wide plans included.
    pub async fn list_plans(&self, tenant_id: Option<Uuid>) -> Result<Vec<SubscriptionPlan>, AppError> {
        self.subscriptions.list_active_plans(tenant_id).await
    }

    /// Starts a subscription now. The first period runs `interval × intervalCount` from
    /// the start; a plan with trial days also records the trial window.
    #[tracing::instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn subscribe(
        &self,
        actor: &Actor,
        request: CreateSubscriptionRequest,
    ) -> Result<Subscription, AppError> {
        let plan = self
            .subscriptions
            .get_plan(request.plan_id)
            .await?
            .filter(|p| p.is_active)
            .filter(|p| p.tenant_id.is_none() || p.tenant_id == Some(actor.tenant_id))
            .ok_or_else(|| AppError::NotFound("Subscription plan not found".to_string()))?;

        let start = Utc::now();
        let count = u32::try_from(plan.interval_count)
            .map_err(|_| AppError::Internal(format!("Plan {} has a negative interval", plan.id)))?;
        let end = plan.interval.advance(start, count).ok_or_else(|| {
            AppError::Internal(format!("Plan {} period end is out of range", plan.id))
        })?;
        let (trial_start, trial_end) = if plan.trial_days > 0 {
            (
                Some(start),
                Some(start + Duration::days(i64::from(plan.trial_days))),
            )
        } else {
            (None, None)
        };

        let subscription = self
            .subscriptions
            .create(NewSubscription {
                user_id: actor.user_id,
                plan_id: plan.id,
                tenant_id: Some(actor.tenant_id),
                current_period_start: start,
                current_period_end: end,
                trial_start,
                trial_end,
            })
            .await?;

        tracing::info!(subscription_id = %subscription.id, plan_id = %plan.id, "Subscription created");
        Ok(subscription)
    }

    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<Subscription>, AppError> {
        self.subscriptions.list_for_user(actor.user_id).await
    }

    pub async fn cancel(&self, actor: &Actor, id: Uuid) -> Result<Subscription, AppError> {
        let subscription = self
            .subscriptions
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;
        actor.ensure_owner(subscription.user_id)?;
        if subscription.status == SubscriptionStatus::Cancelled {
            return Err(AppError::Conflict(
                "Subscription is already cancelled".to_string(),
            ));
        }
        let cancelled = self
            .subscriptions
            .cancel(id)
            .await?
            .ok_or_else(|| AppError::Conflict("Subscription is already cancelled".to_string()))?;
        tracing::info!(subscription_id = %id, user_id = %actor.user_id, "Subscription cancelled");
        Ok(cancelled)
    }
}
