#![allow(dead_code)]

use coursely_api::auth::SessionTokens;
use coursely_api::CurrentUser;
use coursely_core::constants::DEFAULT_TENANT_ID;
use coursely_core::models::UserRole;
use uuid::Uuid;

use super::SESSION_SECRET;

/// A signed-in identity and its bearer token
pub struct TestUser {
    pub user: CurrentUser,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

pub fn user_with_role(role: UserRole) -> TestUser {
    let id = Uuid::new_v4();
    let user = CurrentUser {
        id,
        role,
        email: format!("{}-{}@example.com", role.as_str(), id.simple()),
        tenant_id: DEFAULT_TENANT_ID,
    };
    let token = SessionTokens::new(SESSION_SECRET, 24)
        .issue(&user)
        .expect("Failed to sign session token");
    TestUser { user, token }
}

pub fn student() -> TestUser {
    user_with_role(UserRole::Student)
}

pub fn instructor() -> TestUser {
    user_with_role(UserRole::Instructor)
}

pub fn admin() -> TestUser {
    user_with_role(UserRole::Admin)
}
