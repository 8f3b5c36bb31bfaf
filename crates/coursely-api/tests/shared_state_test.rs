mod helpers;

use chrono::Utc;
use coursely_core::models::NewInvoice;
use coursely_core::money::invoice_prefix;
use coursely_db::{InvoiceRepository, InvoiceRepositoryTrait, PaymentRepository, PaymentRepositoryTrait};
use coursely_infra::{PostgresRateLimitStore, RateLimitStore};
use futures::future::join_all;
use helpers::{auth, fixtures, setup_test_app};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

fn draft_for(user_id: Uuid) -> NewInvoice {
    NewInvoice {
        user_id,
        tenant_id: None,
        course_id: None,
        subscription_id: None,
        subtotal: Decimal::from(1000),
        tax_amount: Decimal::from(180),
        total_amount: Decimal::from(1180),
        currency: "INR".to_string(),
    }
}

#[tokio::test]
async fn test_concurrent_invoices_get_distinct_sequential_numbers() {
    let app = setup_test_app().await;
    let student = auth::student();
    fixtures::insert_user(app.pool(), &student).await;
    let repository = InvoiceRepository::new(app.pool().clone());

    let results = join_all((0..12).map(|_| repository.create_draft(draft_for(student.id())))).await;
    let numbers: Vec<String> = results
        .into_iter()
        .map(|r| r.expect("invoice creation failed").invoice_number)
        .collect();

    let unique: HashSet<&String> = numbers.iter().collect();
    assert_eq!(unique.len(), numbers.len(), "duplicate numbers: {:?}", numbers);

    let prefix = invoice_prefix(Utc::now());
    let mut sequence: Vec<u32> = numbers
        .iter()
        .map(|n| {
            let suffix = n
                .strip_prefix(&format!("{}-", prefix))
                .unwrap_or_else(|| panic!("{} does not start with {}", n, prefix));
            assert_eq!(suffix.len(), 4, "{} is not zero-padded", n);
            suffix.parse().unwrap()
        })
        .collect();
    sequence.sort_unstable();
    assert_eq!(sequence, (1..=12).collect::<Vec<u32>>());
}

#[tokio::test]
async fn test_postgres_store_counts_hits_within_a_window() {
    let app = setup_test_app().await;
    let store = PostgresRateLimitStore::new(app.pool().clone(), Duration::from_secs(900));

    for expected in 1..=5 {
        let window = store.hit("ip:203.0.113.5").await.unwrap();
        assert_eq!(window.count, expected);
        assert!(window.reset_after <= Duration::from_secs(900));
        assert!(window.reset_after > Duration::from_secs(890));
    }

    let other = store.hit("ip:198.51.100.5").await.unwrap();
    assert_eq!(other.count, 1);
}

#[tokio::test]
async fn test_postgres_store_never_loses_concurrent_increments() {
    let app = setup_test_app().await;
    let store = PostgresRateLimitStore::new(app.pool().clone(), Duration::from_secs(900));

    let results = join_all((0..20).map(|_| store.hit("ip:203.0.113.6"))).await;
    let mut counts: Vec<u32> = results.into_iter().map(|r| r.unwrap().count).collect();
    counts.sort_unstable();

    assert_eq!(counts, (1..=20).collect::<Vec<u32>>());
}

#[tokio::test]
async fn test_postgres_store_resets_and_sweeps_closed_windows() {
    let app = setup_test_app().await;
    let store = PostgresRateLimitStore::new(app.pool().clone(), Duration::from_secs(1));

    store.hit("ip:203.0.113.7").await.unwrap();
    store.hit("ip:203.0.113.7").await.unwrap();
    store.hit("ip:203.0.113.8").await.unwrap();
    assert_eq!(store.sweep().await.unwrap(), 0);

    tokio::time::sleep(Duration::from_millis(1200)).await;

    let reopened = store.hit("ip:203.0.113.7").await.unwrap();
    assert_eq!(reopened.count, 1);

    // Only the untouched key's window is closed
    assert_eq!(store.sweep().await.unwrap(), 1);
    assert_eq!(fixtures::count_rows(app.pool(), "rate_limit_counters").await, 1);
}

#[tokio::test]
async fn test_partially_refunded_course_payment_counts_as_paid() {
    let app = setup_test_app().await;
    let instructor = auth::instructor();
    let course_id =
        fixtures::insert_published_course(app.pool(), &instructor, Decimal::from(1000)).await;
    let student = auth::student();
    fixtures::insert_user(app.pool(), &student).await;

    sqlx::query(
        "INSERT INTO payments (user_id, course_id, amount, currency, payment_method, order_id, status, refunded_amount)
         VALUES ($1, $2, 1180, 'INR', 'razorpay', 'order_partial', 'partially_refunded', 180)",
    )
    .bind(student.id())
    .bind(course_id)
    .execute(app.pool())
    .await
    .unwrap();

    let repository = PaymentRepository::new(app.pool().clone());
    assert!(repository
        .has_completed_course_payment(student.id(), course_id)
        .await
        .unwrap());

    sqlx::query("UPDATE payments SET status = 'refunded', refunded_amount = 1180 WHERE order_id = 'order_partial'")
        .execute(app.pool())
        .await
        .unwrap();
    assert!(!repository
        .has_completed_course_payment(student.id(), course_id)
        .await
        .unwrap());
}
