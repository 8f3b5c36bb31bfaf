//! Repository and service wiring

use anyhow::{Context, Result};
use coursely_core::Config;
use coursely_db::{
    AnalyticsRepository, CertificateRepository, CourseRepository, EnrollmentRepository,
    InvoiceRepository, LiveClassRepository, PaymentRepository, RefundRepository,
    SubscriptionRepository, TenantRepository, UserRepository, WebhookRecordRepository,
    WhiteLabelRepository,
};
use coursely_gateways::GatewayRegistry;
use coursely_services::{
    AnalyticsService, CertificateService, CourseService, DomainVerifier, EnrollmentService,
    IdentitySync, LiveClassService, PaymentService, SubscriptionService, TenantService,
    WebhookService, WhiteLabelService,
};
use coursely_storage::{LocalStorage, Storage};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::Authenticator;
use crate::state::AppState;

/// Build every repository and service over one pool
pub async fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(config.storage_path(), config.storage_base_url().to_string())
            .await
            .context("Failed to initialize certificate storage")?,
    );
    tracing::info!(path = config.storage_path(), "Local storage ready");

    let gateways = GatewayRegistry::from_config(config).context("Failed to build gateways")?;
    tracing::info!(
        payment_methods = ?gateways.payment_methods(),
        "Gateway adapters registered"
    );

    let payments = Arc::new(PaymentRepository::new(pool.clone()));
    let invoices = Arc::new(InvoiceRepository::new(pool.clone()));
    let refunds = Arc::new(RefundRepository::new(pool.clone()));
    let subscriptions = Arc::new(SubscriptionRepository::new(pool.clone()));
    let webhook_records = Arc::new(WebhookRecordRepository::new(pool.clone()));
    let course_repository = CourseRepository::new(pool.clone());
    let courses = Arc::new(course_repository.clone());
    let enrollments = Arc::new(EnrollmentRepository::new(pool.clone()));
    let certificates = Arc::new(CertificateRepository::new(pool.clone()));
    let live_classes = Arc::new(LiveClassRepository::new(pool.clone()));
    let analytics = Arc::new(AnalyticsRepository::new(pool.clone()));
    let users = UserRepository::new(pool.clone());

    let verifier = DomainVerifier::new(Duration::from_secs(config.gateway_timeout_secs()))?;

    let state = AppState {
        config: config.clone(),
        pool: pool.clone(),
        storage: storage.clone(),
        authenticator: Authenticator::from_config(config.auth()),
        identity: Arc::new(IdentitySync::new(Arc::new(users.clone()))),
        payments: PaymentService::new(
            payments.clone(),
            invoices,
            refunds.clone(),
            courses.clone(),
            subscriptions.clone(),
            gateways.clone(),
        ),
        webhooks: WebhookService::new(webhook_records, payments.clone(), refunds, gateways.clone()),
        subscriptions: SubscriptionService::new(subscriptions),
        certificates: CertificateService::new(certificates, enrollments.clone(), storage),
        courses: CourseService::new(course_repository),
        enrollments: EnrollmentService::new(courses, enrollments, payments),
        live_classes: LiveClassService::new(live_classes, gateways),
        analytics: AnalyticsService::new(analytics),
        white_label: WhiteLabelService::new(WhiteLabelRepository::new(pool.clone()), verifier),
        tenants: TenantService::new(TenantRepository::new(pool), users),
    };

    Ok(Arc::new(state))
}
