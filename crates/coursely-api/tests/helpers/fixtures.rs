#![allow(dead_code)]

use coursely_core::constants::DEFAULT_TENANT_ID;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::auth::TestUser;

/// Inserts the user row the route gate would otherwise create on first request.
pub async fn insert_user(pool: &PgPool, user: &TestUser) {
    sqlx::query(
        "INSERT INTO users (id, tenant_id, email, role) VALUES ($1, $2, $3, $4::user_role)
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(user.user.id)
    .bind(user.user.tenant_id)
    .bind(&user.user.email)
    .bind(user.user.role.as_str())
    .execute(pool)
    .await
    .expect("Failed to insert user");
}

pub async fn insert_published_course(pool: &PgPool, instructor: &TestUser, price: Decimal) -> Uuid {
    insert_user(pool, instructor).await;
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO courses (id, tenant_id, instructor_id, title, slug, price, currency, is_published, published_at)
         VALUES ($1, $2, $3, $4, $5, $6, 'INR', TRUE, NOW())",
    )
    .bind(id)
    .bind(DEFAULT_TENANT_ID)
    .bind(instructor.user.id)
    .bind("Rust for Backend Engineers")
    .bind(format!("rust-backend-{}", id.simple()))
    .bind(price)
    .execute(pool)
    .await
    .expect("Failed to insert course");
    id
}

pub async fn payment_status(pool: &PgPool, order_id: &str) -> String {
    sqlx::query_scalar("SELECT status::text FROM payments WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(pool)
        .await
        .expect("Payment not found")
}

pub async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("Count failed")
}
