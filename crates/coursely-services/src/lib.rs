//! Coursely Services
//!
//! Business operations over the repositories, storage and gateway adapters. Services take
//! their collaborators as trait objects so the API wires PostgreSQL repositories in and the
//! unit tests wire in-memory doubles.

pub mod actor;
pub mod analytics;
pub mod certificate;
pub mod course;
pub mod identity;
pub mod live_class;
pub mod payment;
pub mod ssrf;
pub mod subscription;
pub mod tenant;
pub mod webhook;
pub mod white_label;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use actor::Actor;
pub use analytics::AnalyticsService;
pub use certificate::{CertificateRenderer, CertificateService};
pub use course::{CourseService, EnrollmentService};
pub use identity::IdentitySync;
pub use live_class::LiveClassService;
pub use payment::PaymentService;
pub use subscription::SubscriptionService;
pub use tenant::TenantService;
pub use webhook::WebhookService;
pub use white_label::{DomainVerifier, WhiteLabelService};
