//! Application state shared by every handler.

use coursely_core::Config;
use coursely_services::{
    AnalyticsService, CertificateService, CourseService, EnrollmentService, IdentitySync,
    LiveClassService, PaymentService, SubscriptionService, TenantService, WebhookService,
    WhiteLabelService,
};
use coursely_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::Authenticator;

pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub storage: Arc<dyn Storage>,
    pub authenticator: Authenticator,
    pub identity: Arc<IdentitySync>,
    pub payments: PaymentService,
    pub webhooks: WebhookService,
    pub subscriptions: SubscriptionService,
    pub certificates: CertificateService,
    pub courses: CourseService,
    pub enrollments: EnrollmentService,
    pub live_classes: LiveClassService,
    pub analytics: AnalyticsService,
    pub white_label: WhiteLabelService,
    pub tenants: TenantService,
}
