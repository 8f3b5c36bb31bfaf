mod helpers;

use axum::http::StatusCode;
use helpers::{auth, fixtures, setup_test_app, TestApp, RAZORPAY_KEY_SECRET, RAZORPAY_WEBHOOK_SECRET};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sha2::Sha256;
use std::str::FromStr;

fn hmac_hex(secret: &str, message: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal encoded as string")).unwrap()
}

async fn mock_order(app: &mut TestApp, order_id: &str) -> mockito::Mock {
    app.razorpay
        .mock("POST", "/v1/orders")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": order_id, "amount": 118000, "status": "created" }).to_string())
        .create_async()
        .await
}

/// Creates a course order for a fresh student and returns `(student, response body)`.
async fn create_course_order(app: &mut TestApp, order_id: &str) -> (auth::TestUser, Value) {
    let instructor = auth::instructor();
    let course_id =
        fixtures::insert_published_course(app.pool(), &instructor, Decimal::from(1000)).await;
    let mock = mock_order(app, order_id).await;

    let student = auth::student();
    let response = app
        .client()
        .post("/api/payments/orders")
        .add_header("Authorization", student.bearer())
        .json(&json!({
            "courseId": course_id,
            "amount": "1000",
            "currency": "INR",
            "paymentMethod": "razorpay"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    mock.assert_async().await;
    (student, response.json())
}

#[tokio::test]
async fn test_order_creates_draft_invoice_with_tax() {
    let mut app = setup_test_app().await;
    let (student, body) = create_course_order(&mut app, "order_tax").await;

    let invoice = &body["invoice"];
    assert_eq!(decimal(&invoice["subtotal"]), Decimal::from(1000));
    assert_eq!(decimal(&invoice["taxAmount"]), Decimal::from(180));
    assert_eq!(decimal(&invoice["totalAmount"]), Decimal::from(1180));
    assert_eq!(invoice["status"], "draft");
    assert_eq!(invoice["currency"], "INR");

    let payment = &body["payment"];
    assert_eq!(payment["orderId"], "order_tax");
    assert_eq!(payment["status"], "pending");
    assert_eq!(decimal(&payment["amount"]), Decimal::from(1180));
    assert_eq!(payment["userId"], student.id().to_string());
    assert_eq!(payment["invoiceId"], invoice["id"]);
}

#[tokio::test]
async fn test_verify_rejects_bad_signature_and_completes_on_good_one() {
    let mut app = setup_test_app().await;
    let (student, _) = create_course_order(&mut app, "order_verify").await;

    let response = app
        .client()
        .post("/api/payments/verify")
        .add_header("Authorization", student.bearer())
        .json(&json!({
            "paymentId": "pay_123",
            "orderId": "order_verify",
            "signature": "deadbeef",
            "paymentMethod": "razorpay"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "PAYMENT_VERIFICATION_FAILED");
    assert_eq!(fixtures::payment_status(app.pool(), "order_verify").await, "pending");

    let signature = hmac_hex(RAZORPAY_KEY_SECRET, b"order_verify|pay_123");
    let response = app
        .client()
        .post("/api/payments/verify")
        .add_header("Authorization", student.bearer())
        .json(&json!({
            "paymentId": "pay_123",
            "orderId": "order_verify",
            "signature": signature,
            "paymentMethod": "razorpay"
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["payment"]["status"], "completed");
    assert_eq!(body["payment"]["paymentId"], "pay_123");

    let invoice_status: String = sqlx::query_scalar(
        "SELECT i.status::text FROM invoices i JOIN payments p ON p.invoice_id = i.id WHERE p.order_id = $1",
    )
    .bind("order_verify")
    .fetch_one(app.pool())
    .await
    .unwrap();
    assert_eq!(invoice_status, "paid");
}

#[tokio::test]
async fn test_verify_by_another_user_is_forbidden() {
    let mut app = setup_test_app().await;
    create_course_order(&mut app, "order_owner").await;

    let stranger = auth::student();
    let signature = hmac_hex(RAZORPAY_KEY_SECRET, b"order_owner|pay_9");
    app.client()
        .post("/api/payments/verify")
        .add_header("Authorization", stranger.bearer())
        .json(&json!({
            "paymentId": "pay_9",
            "orderId": "order_owner",
            "signature": signature,
            "paymentMethod": "razorpay"
        }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    assert_eq!(fixtures::payment_status(app.pool(), "order_owner").await, "pending");
}

#[tokio::test]
async fn test_gateway_failure_leaves_no_draft_invoice() {
    let mut app = setup_test_app().await;
    let instructor = auth::instructor();
    let course_id =
        fixtures::insert_published_course(app.pool(), &instructor, Decimal::from(1000)).await;
    let mock = app
        .razorpay
        .mock("POST", "/v1/orders")
        .with_status(500)
        .with_body(r#"{"error":{"description":"upstream down"}}"#)
        .create_async()
        .await;

    let student = auth::student();
    let response = app
        .client()
        .post("/api/payments/orders")
        .add_header("Authorization", student.bearer())
        .json(&json!({
            "courseId": course_id,
            "amount": "1000",
            "currency": "INR",
            "paymentMethod": "razorpay"
        }))
        .await;

    mock.assert_async().await;
    assert!(response.status_code().is_server_error());
    let body: Value = response.json();
    assert_eq!(body["code"], "PAYMENT_GATEWAY_ERROR");
    assert_eq!(fixtures::count_rows(app.pool(), "invoices").await, 0);
    assert_eq!(fixtures::count_rows(app.pool(), "payments").await, 0);
}

#[tokio::test]
async fn test_order_amount_must_match_course_price() {
    let app = setup_test_app().await;
    let instructor = auth::instructor();
    let course_id =
        fixtures::insert_published_course(app.pool(), &instructor, Decimal::from(1000)).await;

    let student = auth::student();
    let response = app
        .client()
        .post("/api/payments/orders")
        .add_header("Authorization", student.bearer())
        .json(&json!({
            "courseId": course_id,
            "amount": "10",
            "currency": "INR",
            "paymentMethod": "razorpay"
        }))
        .await;

    assert_eq!(response.status_code().as_u16() / 100, 4);
    assert_eq!(fixtures::count_rows(app.pool(), "invoices").await, 0);
}

#[tokio::test]
async fn test_duplicate_webhook_is_recorded_but_not_reapplied() {
    let mut app = setup_test_app().await;
    create_course_order(&mut app, "order_hook").await;

    let payload = json!({
        "event": "payment.captured",
        "payload": { "payment": { "entity": { "id": "pay_hook", "order_id": "order_hook" } } }
    })
    .to_string();
    let signature = hmac_hex(RAZORPAY_WEBHOOK_SECRET, payload.as_bytes());

    let first = app
        .client()
        .post("/api/webhooks/razorpay")
        .add_header("x-razorpay-signature", signature.clone())
        .add_header("x-razorpay-event-id", "evt_1")
        .add_header("content-type", "application/json")
        .bytes(payload.clone().into())
        .await;
    first.assert_status_ok();
    let ack: Value = first.json();
    assert_eq!(ack["duplicate"], false);
    assert_eq!(fixtures::payment_status(app.pool(), "order_hook").await, "completed");

    let updated_at: chrono::DateTime<chrono::Utc> =
        sqlx::query_scalar("SELECT updated_at FROM payments WHERE order_id = 'order_hook'")
            .fetch_one(app.pool())
            .await
            .unwrap();

    let second = app
        .client()
        .post("/api/webhooks/razorpay")
        .add_header("x-razorpay-signature", signature)
        .add_header("x-razorpay-event-id", "evt_1")
        .add_header("content-type", "application/json")
        .bytes(payload.into())
        .await;
    second.assert_status_ok();
    let ack: Value = second.json();
    assert_eq!(ack["duplicate"], true);

    let updated_again: chrono::DateTime<chrono::Utc> =
        sqlx::query_scalar("SELECT updated_at FROM payments WHERE order_id = 'order_hook'")
            .fetch_one(app.pool())
            .await
            .unwrap();
    assert_eq!(updated_at, updated_again);
    assert_eq!(fixtures::count_rows(app.pool(), "webhook_records").await, 2);
}

#[tokio::test]
async fn test_webhook_with_bad_signature_is_stored_as_failed() {
    let app = setup_test_app().await;
    let payload = r#"{"event":"payment.captured"}"#;

    app.client()
        .post("/api/webhooks/razorpay")
        .add_header("x-razorpay-signature", "nope")
        .add_header("content-type", "application/json")
        .bytes(payload.as_bytes().to_vec().into())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let (status, verified): (String, bool) = sqlx::query_as(
        "SELECT status::text, signature_verified FROM webhook_records ORDER BY created_at DESC LIMIT 1",
    )
    .fetch_one(app.pool())
    .await
    .unwrap();
    assert_eq!(status, "failed");
    assert!(!verified);
}
