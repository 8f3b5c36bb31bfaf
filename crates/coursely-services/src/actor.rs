//! The authenticated caller a service acts on behalf of

use coursely_core::models::UserRole;
use coursely_core::AppError;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
    pub tenant_id: Uuid,
    pub email: String,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require(&self, role: UserRole) -> Result<(), AppError> {
        if self.role.at_least(role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "This action requires the {} role",
                role
            )))
        }
    }

    /// Owners and admins pass.
    pub fn ensure_owner(&self, owner_id: Uuid) -> Result<(), AppError> {
        if self.user_id == owner_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have access to this resource".to_string(),
            ))
        }
    }

    /// Tenant an aggregate or listing is scoped to. Admins choose freely (`None` meaning
    /// every tenant); everyone else is pinned to their own tenant.
    pub fn scoped_tenant(&self, requested: Option<Uuid>) -> Option<Uuid> {
        if self.is_admin() {
            requested
        } else {
            Some(self.tenant_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: UserRole) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            role,
            tenant_id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
        }
    }

    #[test]
    fn test_non_admin_is_pinned_to_own_tenant() {
        let student = actor(UserRole::Student);
        let other = Uuid::new_v4();
        assert_eq!(student.scoped_tenant(Some(other)), Some(student.tenant_id));
        assert_eq!(student.scoped_tenant(None), Some(student.tenant_id));

        let admin = actor(UserRole::Admin);
        assert_eq!(admin.scoped_tenant(Some(other)), Some(other));
        assert_eq!(admin.scoped_tenant(None), None);
    }

    #[test]
    fn test_ownership_and_roles() {
        let instructor = actor(UserRole::Instructor);
        assert!(instructor.ensure_owner(instructor.user_id).is_ok());
        assert!(matches!(
            instructor.ensure_owner(Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        ));
        assert!(instructor.require(UserRole::Student).is_ok());
        assert!(instructor.require(UserRole::Admin).is_err());
        assert!(actor(UserRole::Admin).ensure_owner(Uuid::new_v4()).is_ok());
    }
}
