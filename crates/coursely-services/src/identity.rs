//! Mirrors authenticated identities into the local `users` table

use coursely_core::models::UserRole;
use coursely_core::AppError;
use coursely_db::UserRepositoryTrait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::actor::Actor;

/// Upserts a user row the first time this process sees an identity, and again only when its
/// role or email changes. Foreign keys to `users` then hold for every authenticated caller.
pub struct IdentitySync {
    users: Arc<dyn UserRepositoryTrait>,
    seen: Mutex<HashMap<Uuid, (UserRole, String)>>,
}

impl IdentitySync {
    pub fn new(users: Arc<dyn UserRepositoryTrait>) -> Self {
        Self {
            users,
            seen: Mutex::new(HashMap::new()),
        }
    }

    fn is_current(&self, actor: &Actor) -> bool {
        match self.seen.lock() {
            Ok(seen) => seen
                .get(&actor.user_id)
                .is_some_and(|(role, email)| *role == actor.role && *email == actor.email),
            Err(_) => false,
        }
    }

    /// Returns `true` when a row was written.
    pub async fn ensure(&self, actor: &Actor) -> Result<bool, AppError> {
        if self.is_current(actor) {
            return Ok(false);
        }
        self.users
            .upsert_identity(actor.user_id, actor.tenant_id, &actor.email, actor.role)
            .await?;
        if let Ok(mut seen) = self.seen.lock() {
            seen.insert(actor.user_id, (actor.role, actor.email.clone()));
        }
        tracing::debug!(user_id = %actor.user_id, role = %actor.role, "Identity synced");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{actor, MockUserRepository};

    #[tokio::test]
    async fn test_upserts_once_per_identity() {
        let repo = MockUserRepository::new();
        let sync = IdentitySync::new(Arc::new(repo.clone()));
        let student = actor(UserRole::Student);

        assert!(sync.ensure(&student).await.unwrap());
        assert!(!sync.ensure(&student).await.unwrap());

        assert_eq!(repo.upsert_count(), 1);
    }

    #[tokio::test]
    async fn test_role_change_upserts_again() {
        let repo = MockUserRepository::new();
        let sync = IdentitySync::new(Arc::new(repo.clone()));
        let mut user = actor(UserRole::Student);
        sync.ensure(&user).await.unwrap();

        user.role = UserRole::Instructor;
        sync.ensure(&user).await.unwrap();
        sync.ensure(&actor(UserRole::Student)).await.unwrap();

        assert_eq!(repo.upsert_count(), 3);
    }
}
