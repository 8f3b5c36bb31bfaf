mod helpers;

use axum::http::StatusCode;
use helpers::{auth, fixtures, setup_test_app, TestApp};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

/// Enrolls a fresh student in a free course and returns `(student, course_id)`.
async fn enrolled_student(app: &TestApp) -> (auth::TestUser, Uuid) {
    let instructor = auth::instructor();
    let course_id = fixtures::insert_published_course(app.pool(), &instructor, Decimal::ZERO).await;

    let student = auth::student();
    app.client()
        .post(&format!("/api/courses/{}/enroll", course_id))
        .add_header("Authorization", student.bearer())
        .await
        .assert_status(StatusCode::CREATED);
    (student, course_id)
}

async fn complete_course(app: &TestApp, student: &auth::TestUser, course_id: Uuid) {
    app.client()
        .put(&format!("/api/courses/{}/progress", course_id))
        .add_header("Authorization", student.bearer())
        .json(&json!({ "progress": 100 }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_issue_requires_completed_enrollment() {
    let app = setup_test_app().await;
    let (student, course_id) = enrolled_student(&app).await;

    let response = app
        .client()
        .post("/api/certificates")
        .add_header("Authorization", student.bearer())
        .json(&json!({ "courseId": course_id }))
        .await;
    response.assert_status(StatusCode::PRECONDITION_FAILED);
    assert_eq!(fixtures::count_rows(app.pool(), "certificates").await, 0);
}

#[tokio::test]
async fn test_issue_verify_download_and_revoke() {
    let app = setup_test_app().await;
    let (student, course_id) = enrolled_student(&app).await;
    complete_course(&app, &student, course_id).await;

    let response = app
        .client()
        .post("/api/certificates")
        .add_header("Authorization", student.bearer())
        .json(&json!({ "courseId": course_id }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let certificate: Value = response.json();
    let id = certificate["id"].as_str().unwrap().to_string();
    let code = certificate["verificationCode"].as_str().unwrap().to_string();
    assert!(certificate["certificateNumber"]
        .as_str()
        .unwrap()
        .starts_with("CERT-"));

    // Second issuance for the same course conflicts
    app.client()
        .post("/api/certificates")
        .add_header("Authorization", student.bearer())
        .json(&json!({ "courseId": course_id }))
        .await
        .assert_status(StatusCode::CONFLICT);

    // Verification is public
    let response = app
        .client()
        .get(&format!("/api/certificates/verify/{}", code))
        .add_header("User-Agent", "verifier/1.0")
        .await;
    response.assert_status_ok();
    let result: Value = response.json();
    assert_eq!(result["valid"], true);
    assert_eq!(result["courseTitle"], "Rust for Backend Engineers");

    let download = app
        .client()
        .get(&format!("/api/certificates/{}/download", id))
        .add_header("Authorization", student.bearer())
        .await;
    download.assert_status_ok();
    assert_eq!(download.header("content-type"), "application/pdf");
    assert!(download.as_bytes().starts_with(b"%PDF"));

    let admin = auth::admin();
    app.client()
        .post(&format!("/api/certificates/{}/revoke", id))
        .add_header("Authorization", admin.bearer())
        .json(&json!({ "reason": "Issued in error" }))
        .await
        .assert_status_ok();

    let result: Value = app
        .client()
        .get(&format!("/api/certificates/verify/{}", code))
        .await
        .json();
    assert_eq!(result["valid"], false);
    assert_eq!(result["status"], "revoked");

    let logged: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM certificate_verifications WHERE verification_code = $1")
            .bind(&code)
            .fetch_one(app.pool())
            .await
            .unwrap();
    assert_eq!(logged, 2);
}

#[tokio::test]
async fn test_unknown_code_is_invalid_and_still_logged() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/certificates/verify/NOPE").await;
    response.assert_status_ok();
    let result: Value = response.json();
    assert_eq!(result["valid"], false);
    assert!(result["certificateNumber"].is_null());

    assert_eq!(
        fixtures::count_rows(app.pool(), "certificate_verifications").await,
        1
    );
}
