use coursely_core::models::{User, UserRole};
use coursely_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    /// Inserts or refreshes the local mirror of an external identity.
    async fn upsert_identity(
        &self,
        id: Uuid,
        tenant_id: Uuid,
        email: &str,
        role: UserRole,
    ) -> Result<User, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<User>, AppError>;
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update"))]
    pub async fn set_full_name(&self, id: Uuid, full_name: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            "UPDATE users SET full_name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(full_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait::async_trait]
impl UserRepositoryTrait for UserRepository {
    #[tracing::instrument(skip(self, email), fields(db.table = "users", db.operation = "upsert"))]
    async fn upsert_identity(
        &self,
        id: Uuid,
        tenant_id: Uuid,
        email: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        // The tenant is fixed on first sight; later logins only refresh email and role.
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            INSERT INTO users (id, tenant_id, email, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email, role = EXCLUDED.role, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(email)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn get(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
