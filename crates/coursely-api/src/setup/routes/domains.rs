//! Feature route groups.

use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;

pub fn page_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(handlers::pages::dashboard))
        .route("/instructor", get(handlers::pages::instructor))
        .route("/admin", get(handlers::pages::admin))
        .route("/sign-in", get(handlers::pages::sign_in))
        .route("/instructor/sign-in", get(handlers::pages::sign_in))
        .route("/admin/sign-in", get(handlers::pages::sign_in))
}

pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/auth/session",
        post(handlers::auth_session::create_session)
            .delete(handlers::auth_session::delete_session),
    )
}

pub fn course_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/courses",
            get(handlers::courses::list_courses).post(handlers::courses::create_course),
        )
        .route("/api/courses/mine", get(handlers::courses::list_my_courses))
        .route(
            "/api/courses/{id}",
            get(handlers::courses::get_course)
                .put(handlers::courses::update_course)
                .delete(handlers::courses::delete_course),
        )
        .route("/api/courses/{id}/publish", put(handlers::courses::publish_course))
        .route("/api/courses/{id}/modules", post(handlers::courses::add_module))
        .route("/api/modules/{id}/lessons", post(handlers::courses::add_lesson))
        .route("/api/courses/{id}/enroll", post(handlers::enrollments::enroll))
        .route(
            "/api/courses/{id}/progress",
            put(handlers::enrollments::update_progress),
        )
        .route("/api/enrollments", get(handlers::enrollments::list_enrollments))
}

pub fn payment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/payments", get(handlers::payments::list_payments))
        .route("/api/payments/orders", post(handlers::payments::create_order))
        .route("/api/payments/verify", post(handlers::payments::verify_payment))
        .route("/api/payments/{id}", get(handlers::payments::get_payment))
        .route(
            "/api/payments/{id}/refunds",
            get(handlers::payments::list_refunds).post(handlers::payments::create_refund),
        )
        .route("/api/invoices", get(handlers::invoices::list_invoices))
        .route("/api/invoices/{id}", get(handlers::invoices::get_invoice))
}

pub fn subscription_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/subscriptions",
            get(handlers::subscriptions::list_subscriptions)
                .post(handlers::subscriptions::subscribe),
        )
        .route(
            "/api/subscriptions/plans",
            get(handlers::subscriptions::list_plans).post(handlers::subscriptions::create_plan),
        )
        .route(
            "/api/subscriptions/{id}/cancel",
            post(handlers::subscriptions::cancel_subscription),
        )
}

pub fn webhook_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/webhooks", get(handlers::webhooks::list_webhooks))
        .route("/api/webhooks/razorpay", post(handlers::webhooks::razorpay_webhook))
        .route("/api/webhooks/cashfree", post(handlers::webhooks::cashfree_webhook))
}

pub fn certificate_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/certificates",
            get(handlers::certificates::list_certificates)
                .post(handlers::certificates::issue_certificate),
        )
        .route(
            "/api/certificates/verify/{code}",
            get(handlers::certificates::verify_certificate),
        )
        .route(
            "/api/certificates/templates",
            get(handlers::certificates::list_templates)
                .post(handlers::certificates::create_template),
        )
        .route(
            "/api/certificates/signatures",
            post(handlers::certificates::upload_signature),
        )
        .route("/api/certificates/{id}", get(handlers::certificates::get_certificate))
        .route(
            "/api/certificates/{id}/download",
            get(handlers::certificates::download_certificate),
        )
        .route(
            "/api/certificates/{id}/revoke",
            post(handlers::certificates::revoke_certificate),
        )
}

pub fn analytics_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/analytics/overview", get(handlers::analytics::overview))
        .route("/api/analytics/revenue", get(handlers::analytics::revenue))
        .route("/api/analytics/enrollments", get(handlers::analytics::enrollments))
        .route("/api/analytics/user-growth", get(handlers::analytics::user_growth))
        .route(
            "/api/analytics/course-performance",
            get(handlers::analytics::course_performance),
        )
        .route("/api/analytics/live-classes", get(handlers::analytics::live_classes))
}

pub fn live_class_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/live-classes",
            post(handlers::live_classes::schedule_live_class),
        )
        .route(
            "/api/courses/{id}/live-classes",
            get(handlers::live_classes::list_course_live_classes),
        )
        .route("/api/live-classes/{id}", get(handlers::live_classes::get_live_class))
        .route(
            "/api/live-classes/{id}/start",
            post(handlers::live_classes::start_live_class),
        )
        .route(
            "/api/live-classes/{id}/complete",
            post(handlers::live_classes::complete_live_class),
        )
        .route(
            "/api/live-classes/{id}/cancel",
            post(handlers::live_classes::cancel_live_class),
        )
}

pub fn white_label_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/white-label/settings",
            get(handlers::white_label::get_settings).put(handlers::white_label::update_settings),
        )
        .route(
            "/api/white-label/domains",
            get(handlers::white_label::list_domains).post(handlers::white_label::add_domain),
        )
        .route(
            "/api/white-label/domains/{id}/verify",
            post(handlers::white_label::verify_domain),
        )
        .route(
            "/api/white-label/email-templates",
            get(handlers::white_label::list_email_templates),
        )
        .route(
            "/api/white-label/email-templates/{kind}",
            put(handlers::white_label::upsert_email_template),
        )
        .route(
            "/api/white-label/email-templates/{kind}/render",
            post(handlers::white_label::render_email_template),
        )
        .route(
            "/api/white-label/landing-pages",
            get(handlers::white_label::list_landing_pages)
                .post(handlers::white_label::create_landing_page),
        )
        .route(
            "/api/white-label/landing-pages/{id}",
            put(handlers::white_label::update_landing_page),
        )
        .route(
            "/api/white-label/landing-pages/{id}/publish",
            put(handlers::white_label::publish_landing_page),
        )
}

pub fn tenant_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/tenants",
            get(handlers::tenants::list_tenants).post(handlers::tenants::create_tenant),
        )
        .route(
            "/api/tenants/by-slug/{slug}",
            get(handlers::tenants::get_tenant_by_slug),
        )
        .route("/api/tenants/{id}", get(handlers::tenants::get_tenant))
        .route(
            "/api/tenants/{id}/settings",
            get(handlers::tenants::get_tenant_settings),
        )
        .route(
            "/api/tenants/{id}/pages/{slug}",
            get(handlers::tenants::get_landing_page),
        )
        .route("/api/users/me", get(handlers::tenants::me).put(handlers::tenants::update_me))
}
