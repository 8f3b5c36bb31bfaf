//! Test doubles and fixtures shared by the service tests

pub mod mock_gateways;
pub mod mock_repositories;

pub use mock_gateways::{MockMeetingProvider, MockPaymentGateway};
pub use mock_repositories::{
    completed_payment, plan, MockBillingStore, MockLearningStore, MockStorage,
    MockUserRepository,
};

use chrono::Utc;
use coursely_core::models::{Course, UserRole};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::Actor;

pub fn actor(role: UserRole) -> Actor {
    Actor {
        user_id: Uuid::new_v4(),
        role,
        tenant_id: Uuid::new_v4(),
        email: format!("{}@example.com", role),
    }
}

pub fn course(tenant_id: Uuid, instructor_id: Uuid, price: Decimal) -> Course {
    let now = Utc::now();
    Course {
        id: Uuid::new_v4(),
        tenant_id,
        instructor_id,
        title: "Ownership and Borrowing".to_string(),
        slug: "ownership-and-borrowing".to_string(),
        description: None,
        thumbnail_url: None,
        price,
        currency: "INR".to_string(),
        is_published: true,
        published_at: Some(now),
        created_at: now,
        updated_at: now,
    }
}
