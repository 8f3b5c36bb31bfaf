//! Tenants and the caller's own user record

use coursely_core::constants::clamp_pagination;
use coursely_core::models::{
    CreateTenantRequest, Tenant, UpdateProfileRequest, User, UserRole,
};
use coursely_core::AppError;
use coursely_db::{TenantRepository, UserRepository, UserRepositoryTrait};
use uuid::Uuid;
use validator::Validate;

use crate::actor::Actor;

#[derive(Clone)]
pub struct TenantService {
    tenants: TenantRepository,
    users: UserRepository,
}

impl TenantService {
    pub fn new(tenants: TenantRepository, users: UserRepository) -> Self {
        Self { tenants, users }
    }

    pub async fn create(&self, actor: &Actor, request: CreateTenantRequest) -> Result<Tenant, AppError> {
        actor.require(UserRole::Admin)?;
        request.validate()?;
        let tenant = self.tenants.create(&request).await?;
        tracing::info!(
            target: "audit",
            event = "tenant.created",
            tenant_id = %tenant.id,
            slug = %tenant.slug,
            admin_id = %actor.user_id,
            "Tenant created"
        );
        Ok(tenant)
    }

    /// Active tenants only.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Tenant, AppError> {
        self.tenants
            .get_by_slug(&slug.to_ascii_lowercase())
            .await?
            .ok_or_else(|| AppError::NotFound("Tenant not found".to_string()))
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Tenant, AppError> {
        if !actor.is_admin() && actor.tenant_id != id {
            return Err(AppError::NotFound("Tenant not found".to_string()));
        }
        self.tenants
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Tenant not found".to_string()))
    }

    pub async fn list(
        &self,
        actor: &Actor,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Tenant>, AppError> {
        actor.require(UserRole::Admin)?;
        let (limit, offset) = clamp_pagination(limit, offset);
        self.tenants.list(limit, offset).await
    }

    pub async fn me(&self, actor: &Actor) -> Result<User, AppError> {
        self.users
            .get(actor.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update_profile(
        &self,
        actor: &Actor,
        request: UpdateProfileRequest,
    ) -> Result<User, AppError> {
        request.validate()?;
        self.users
            .set_full_name(actor.user_id, request.full_name.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
