//! Repositories for the data access layer
//!
//! Organized into billing/ (payments, invoices, refunds, subscriptions, webhook records),
//! learning/ (courses, enrollments, certificates, live classes) and control/ (tenants,
//! users, white-label). Services depend on the `*RepositoryTrait` abstractions so they can
//! be exercised against in-memory doubles.

pub mod analytics;
pub mod billing;
pub mod control;
pub mod learning;
pub mod transaction;

pub use analytics::{AnalyticsFilter, AnalyticsRepository, AnalyticsRepositoryTrait};
pub use billing::{
    InvoiceRepository, InvoiceRepositoryTrait, PaymentRepository, PaymentRepositoryTrait,
    RefundRepository, RefundRepositoryTrait, SubscriptionRepository,
    SubscriptionRepositoryTrait, WebhookRecordRepository, WebhookRecordRepositoryTrait,
};
pub use control::{TenantRepository, UserRepository, UserRepositoryTrait, WhiteLabelRepository};
pub use learning::{
    CertificateRepository, CertificateRepositoryTrait, CourseRepository, CourseRepositoryTrait,
    CourseOwner, EnrollmentRepository, EnrollmentRepositoryTrait, IssuanceContext,
    LiveClassRepository, LiveClassRepositoryTrait,
};
