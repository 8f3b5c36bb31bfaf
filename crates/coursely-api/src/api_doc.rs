//! OpenAPI documentation, served at `/api/openapi.json` and rendered by RapiDoc at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use coursely_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Coursely API",
        version = "0.1.0",
        description = "Multi-tenant e-learning backend: courses, enrollments, payments through Razorpay and Cashfree, certificates, live classes, analytics and white-label settings. Protected endpoints take a `coursely_session` cookie or an `Authorization: Bearer` token."
    ),
    paths(
        // Session
        handlers::auth_session::create_session,
        handlers::auth_session::delete_session,
        // Courses
        handlers::courses::list_courses,
        handlers::courses::list_my_courses,
        handlers::courses::get_course,
        handlers::courses::create_course,
        handlers::courses::update_course,
        handlers::courses::publish_course,
        handlers::courses::delete_course,
        handlers::courses::add_module,
        handlers::courses::add_lesson,
        // Enrollments
        handlers::enrollments::enroll,
        handlers::enrollments::list_enrollments,
        handlers::enrollments::update_progress,
        // Payments
        handlers::payments::create_order,
        handlers::payments::verify_payment,
        handlers::payments::list_payments,
        handlers::payments::get_payment,
        handlers::payments::create_refund,
        handlers::payments::list_refunds,
        handlers::invoices::list_invoices,
        handlers::invoices::get_invoice,
        // Subscriptions
        handlers::subscriptions::list_plans,
        handlers::subscriptions::create_plan,
        handlers::subscriptions::subscribe,
        handlers::subscriptions::list_subscriptions,
        handlers::subscriptions::cancel_subscription,
        // Webhooks
        handlers::webhooks::razorpay_webhook,
        handlers::webhooks::cashfree_webhook,
        handlers::webhooks::list_webhooks,
        // Certificates
        handlers::certificates::issue_certificate,
        handlers::certificates::verify_certificate,
        handlers::certificates::list_certificates,
        handlers::certificates::get_certificate,
        handlers::certificates::download_certificate,
        handlers::certificates::revoke_certificate,
        handlers::certificates::create_template,
        handlers::certificates::list_templates,
        handlers::certificates::upload_signature,
        // Analytics
        handlers::analytics::overview,
        handlers::analytics::revenue,
        handlers::analytics::enrollments,
        handlers::analytics::user_growth,
        handlers::analytics::course_performance,
        handlers::analytics::live_classes,
        // Live classes
        handlers::live_classes::schedule_live_class,
        handlers::live_classes::list_course_live_classes,
        handlers::live_classes::get_live_class,
        handlers::live_classes::start_live_class,
        handlers::live_classes::complete_live_class,
        handlers::live_classes::cancel_live_class,
        // White-label
        handlers::white_label::get_settings,
        handlers::white_label::update_settings,
        handlers::white_label::add_domain,
        handlers::white_label::list_domains,
        handlers::white_label::verify_domain,
        handlers::white_label::list_email_templates,
        handlers::white_label::upsert_email_template,
        handlers::white_label::render_email_template,
        handlers::white_label::create_landing_page,
        handlers::white_label::list_landing_pages,
        handlers::white_label::update_landing_page,
        handlers::white_label::publish_landing_page,
        // Tenants & users
        handlers::tenants::create_tenant,
        handlers::tenants::list_tenants,
        handlers::tenants::get_tenant_by_slug,
        handlers::tenants::get_tenant,
        handlers::tenants::get_tenant_settings,
        handlers::tenants::get_landing_page,
        handlers::tenants::me,
        handlers::tenants::update_me,
    ),
    components(
        schemas(
            error::ErrorResponse,
            handlers::PublishRequest,
            handlers::auth_session::SessionResponse,
            models::UserRole,
            models::User,
            models::UpdateProfileRequest,
            models::Tenant,
            models::CreateTenantRequest,
            models::Course,
            models::CourseModule,
            models::Lesson,
            models::ModuleWithLessons,
            models::CourseDetail,
            models::CreateCourseRequest,
            models::UpdateCourseRequest,
            models::CreateModuleRequest,
            models::CreateLessonRequest,
            models::Enrollment,
            models::EnrollmentStatus,
            models::UpdateProgressRequest,
            models::PaymentMethod,
            models::PaymentStatus,
            models::Payment,
            models::CreateOrderRequest,
            models::CreateOrderResponse,
            models::VerifyPaymentRequest,
            models::VerifyPaymentResponse,
            models::RefundReason,
            models::RefundStatus,
            models::Refund,
            models::CreateRefundRequest,
            models::RefundResponse,
            models::InvoiceStatus,
            models::Invoice,
            models::PlanInterval,
            models::SubscriptionStatus,
            models::SubscriptionPlan,
            models::Subscription,
            models::CreatePlanRequest,
            models::CreateSubscriptionRequest,
            models::WebhookProvider,
            models::WebhookStatus,
            models::WebhookRecord,
            models::WebhookAck,
            models::CertificateStatus,
            models::Certificate,
            models::TemplateFieldKind,
            models::TemplateField,
            models::SignaturePlacement,
            models::CertificateTemplate,
            models::CreateTemplateRequest,
            models::DigitalSignature,
            models::UploadSignatureRequest,
            models::IssueCertificateRequest,
            models::RevokeCertificateRequest,
            models::VerificationResult,
            models::OverviewStats,
            models::DailyCount,
            models::DailyAmount,
            models::LabelCount,
            models::MethodRevenue,
            models::RevenueStats,
            models::CourseCount,
            models::EnrollmentStats,
            models::UserGrowthStats,
            models::CoursePerformance,
            models::LiveClassStats,
            models::MeetingPlatform,
            models::LiveClassStatus,
            models::LiveClass,
            models::ScheduleLiveClassRequest,
            models::BrandingSettings,
            models::ThemeSettings,
            models::FeatureSettings,
            models::SeoSettings,
            models::WhiteLabelSettings,
            models::SettingsUpdate,
            models::CustomDomain,
            models::AddDomainRequest,
            models::EmailTemplateKind,
            models::EmailTemplate,
            models::UpsertEmailTemplateRequest,
            models::RenderEmailRequest,
            models::RenderedEmail,
            models::Testimonial,
            models::FaqItem,
            models::CallToAction,
            models::LandingSection,
            models::LandingPage,
            models::CreateLandingPageRequest,
            models::UpdateLandingPageRequest,
        )
    ),
    tags(
        (name = "auth", description = "Session cookie exchange"),
        (name = "courses", description = "Course catalogue and authoring"),
        (name = "enrollments", description = "Enrollment and progress"),
        (name = "payments", description = "Orders, verification, refunds and invoices"),
        (name = "subscriptions", description = "Plans and subscriptions"),
        (name = "webhooks", description = "Payment gateway callbacks"),
        (name = "certificates", description = "Completion certificates and public verification"),
        (name = "analytics", description = "Aggregate reports"),
        (name = "live-classes", description = "Zoom and Google Meet sessions"),
        (name = "white-label", description = "Tenant branding, domains, email templates and landing pages"),
        (name = "tenants", description = "Tenants and the caller's user record")
    )
)]
pub struct ApiDoc;
