//! Coursely Database Layer
//!
//! PostgreSQL repositories for every persisted entity, the repository traits services
//! depend on, and transaction helpers.

pub mod db;

// Re-exports: repositories
pub use db::{
    AnalyticsRepository, CertificateRepository, CourseRepository, EnrollmentRepository,
    InvoiceRepository, LiveClassRepository, PaymentRepository, RefundRepository,
    SubscriptionRepository, TenantRepository, UserRepository, WebhookRecordRepository,
    WhiteLabelRepository,
};

// Re-exports: traits
pub use db::{
    AnalyticsFilter, AnalyticsRepositoryTrait, CertificateRepositoryTrait, CourseOwner,
    CourseRepositoryTrait, EnrollmentRepositoryTrait, InvoiceRepositoryTrait, IssuanceContext,
    LiveClassRepositoryTrait, PaymentRepositoryTrait, RefundRepositoryTrait,
    SubscriptionRepositoryTrait, UserRepositoryTrait, WebhookRecordRepositoryTrait,
};

// Re-exports: Transaction utilities
pub use db::transaction::{with_transaction, TransactionGuard};
